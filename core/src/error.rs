use thiserror::Error;

/// Errors raised by the session core outside of the dispatch taxonomy.
///
/// Dispatch failures are never reported through this type; they land in
/// [`crate::SessionError`] inside the session's failure state.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("An analysis is already in progress")]
    Busy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    InvalidConfig(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Export error: {0}")]
    Export(#[from] serde_json::Error),

    #[error("No prediction result to export")]
    NothingToExport,
}

impl From<CoreError> for String {
    fn from(err: CoreError) -> Self {
        err.to_string()
    }
}
