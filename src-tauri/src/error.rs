use actionlens_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionLensError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tauri_plugin_store::Error> for ActionLensError {
    fn from(err: tauri_plugin_store::Error) -> Self {
        ActionLensError::Store(err.to_string())
    }
}

impl From<ActionLensError> for String {
    fn from(err: ActionLensError) -> Self {
        err.to_string()
    }
}
