//! Session core for ActionLens: validates a selected video, sends it to the
//! inference service, and tracks the result for the presentation layer.

pub mod classify;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod preview;
pub mod session;
pub mod transport;
pub mod types;
pub mod validator;

pub use classify::{DispatchOutcome, SessionError};
pub use config::AnalysisConfig;
pub use controller::{Observer, Reconfigured, SelectionHandle, SessionController};
pub use error::CoreError;
pub use preview::{PreviewHandle, PreviewRegistry, PreviewSource};
pub use session::{
    AnalysisSession, Notice, Phase, PhaseKind, Selection, SessionSettings, SessionSnapshot,
};
pub use transport::{ActionClasses, HttpTransport, InferenceTransport, ServiceHealth};
pub use types::{DispatchTicket, MediaFile, MediaSource, PredictionRequest, PredictionResponse};
pub use validator::{validate, ValidationReason, ValidationResult, ValidationRules};
