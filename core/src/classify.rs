//! Failure taxonomy and the mapping from dispatch outcomes onto it.
//!
//! Classification only looks at what was observed: whether a response came
//! back at all, whether the deadline passed first, and which status and body
//! arrived. Transport-specific error types are converted into a
//! [`DispatchOutcome`] before they reach this module.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::types::PredictionResponse;
use crate::validator::ValidationReason;

pub const NETWORK_UNREACHABLE_MESSAGE: &str = "Cannot connect to server. Is the backend running?";
pub const NETWORK_GENERIC_MESSAGE: &str = "Network error. Please check your connection.";
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Unexpected response from server. Please try again.";

/// Every way an analysis can fail. Each variant renders to the one message
/// shown to the user.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SessionError {
    /// Refused locally; the network was never contacted.
    #[error("{}", .0.message())]
    ClientValidation(ValidationReason),

    #[error("{}", NETWORK_UNREACHABLE_MESSAGE)]
    NetworkUnreachable,

    #[error("{}", NETWORK_GENERIC_MESSAGE)]
    Timeout,

    #[error("{message}")]
    ServerError { status: u16, message: String },
}

impl SessionError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// What a transport observed for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A response arrived, successful or not.
    Response { status: u16, body: Vec<u8> },
    /// Nothing came back: the connection failed or the request never left.
    NoResponse,
    /// The deadline passed before a response arrived.
    DeadlineExceeded,
    /// The payload was over the send cap, so nothing was sent.
    PayloadTooLarge { byte_size: u64, max_bytes: u64 },
    /// The selected file could not be read back, so nothing was sent.
    SourceUnreadable { detail: String },
}

/// Fallback message for a status when the service supplied none.
pub fn default_status_message(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Invalid request. Please check your file and try again."),
        413 => Some("File too large. Maximum size is 50MB."),
        415 => Some("Unsupported file format. Please use MP4, AVI, or MOV."),
        422 => Some("Could not process video. File may be corrupted."),
        500 => Some("Server error occurred. Please try again later."),
        503 => Some("Model is still loading. Please wait a moment and try again."),
        _ => None,
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Server message, then the status table, then a generic line.
pub fn resolve_server_message(status: u16, body: &[u8]) -> String {
    let supplied = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|msg| msg.trim().to_string())
        .filter(|msg| !msg.is_empty());

    supplied
        .or_else(|| default_status_message(status).map(str::to_string))
        .unwrap_or_else(|| format!("Error {}: Something went wrong.", status))
}

/// Classify an outcome whose success body is any JSON document.
pub fn classify_json<T: DeserializeOwned>(outcome: DispatchOutcome) -> Result<T, SessionError> {
    match outcome {
        DispatchOutcome::NoResponse => Err(SessionError::NetworkUnreachable),
        DispatchOutcome::DeadlineExceeded => Err(SessionError::Timeout),
        DispatchOutcome::PayloadTooLarge {
            byte_size,
            max_bytes,
        } => Err(SessionError::ClientValidation(ValidationReason::TooLarge {
            byte_size,
            max_bytes,
        })),
        DispatchOutcome::SourceUnreadable { detail } => Err(SessionError::ClientValidation(
            ValidationReason::Unreadable { detail },
        )),
        DispatchOutcome::Response { status, body } if (200..300).contains(&status) => {
            serde_json::from_slice::<T>(&body).map_err(|e| {
                warn!("Malformed success body (status {}): {}", status, e);
                SessionError::ServerError {
                    status,
                    message: MALFORMED_RESPONSE_MESSAGE.to_string(),
                }
            })
        }
        DispatchOutcome::Response { status, body } => Err(SessionError::ServerError {
            status,
            message: resolve_server_message(status, &body),
        }),
    }
}

/// Classify the outcome of a prediction dispatch.
///
/// A 2xx body that decodes but carries out-of-range values is treated the
/// same as one that does not decode.
pub fn classify(outcome: DispatchOutcome) -> Result<PredictionResponse, SessionError> {
    let status = match &outcome {
        DispatchOutcome::Response { status, .. } => *status,
        _ => 0,
    };
    let response: PredictionResponse = classify_json(outcome)?;
    if !response.is_well_formed() {
        warn!("Prediction out of range: {:?}", response);
        return Err(SessionError::ServerError {
            status,
            message: MALFORMED_RESPONSE_MESSAGE.to_string(),
        });
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::UNREADABLE_FILE_MESSAGE;

    fn response(status: u16, body: &str) -> DispatchOutcome {
        DispatchOutcome::Response {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_success_decodes_prediction() {
        let result = classify(response(
            200,
            r#"{"action": "basketball", "confidence": 92.3, "processing_time": 1.8}"#,
        ))
        .unwrap();
        assert_eq!(result.action, "basketball");
        assert_eq!(result.confidence, 92.3);
        assert_eq!(result.processing_time, 1.8);
    }

    #[test]
    fn test_no_response_is_network_unreachable() {
        let err = classify(DispatchOutcome::NoResponse).unwrap_err();
        assert_eq!(err, SessionError::NetworkUnreachable);
        assert_eq!(err.message(), NETWORK_UNREACHABLE_MESSAGE);
    }

    #[test]
    fn test_deadline_is_timeout_with_generic_message() {
        let err = classify(DispatchOutcome::DeadlineExceeded).unwrap_err();
        assert_eq!(err, SessionError::Timeout);
        assert_eq!(err.message(), NETWORK_GENERIC_MESSAGE);
        assert_ne!(Some(err.message().as_str()), default_status_message(503));
    }

    #[test]
    fn test_503_uses_table_message() {
        let err = classify(response(503, "")).unwrap_err();
        assert_eq!(
            err,
            SessionError::ServerError {
                status: 503,
                message: "Model is still loading. Please wait a moment and try again.".to_string(),
            }
        );
    }

    #[test]
    fn test_415_without_body_uses_table_message() {
        let err = classify(response(415, "")).unwrap_err();
        assert_eq!(err.status(), Some(415));
        assert_eq!(
            err.message(),
            "Unsupported file format. Please use MP4, AVI, or MOV."
        );
    }

    #[test]
    fn test_server_message_takes_precedence() {
        let err = classify(response(
            422,
            r#"{"error": "Could not process video: Could not read frames from video"}"#,
        ))
        .unwrap_err();
        assert_eq!(
            err.message(),
            "Could not process video: Could not read frames from video"
        );
    }

    #[test]
    fn test_blank_server_message_falls_back_to_table() {
        let err = classify(response(500, r#"{"error": "   "}"#)).unwrap_err();
        assert_eq!(err.message(), "Server error occurred. Please try again later.");
    }

    #[test]
    fn test_unknown_status_uses_generic_message() {
        let err = classify(response(418, "<html>teapot</html>")).unwrap_err();
        assert_eq!(err.message(), "Error 418: Something went wrong.");
    }

    #[test]
    fn test_malformed_success_body_is_server_error() {
        let err = classify(response(200, "not json")).unwrap_err();
        assert_eq!(
            err,
            SessionError::ServerError {
                status: 200,
                message: MALFORMED_RESPONSE_MESSAGE.to_string(),
            }
        );
    }

    #[test]
    fn test_out_of_range_success_body_is_server_error() {
        let err = classify(response(
            200,
            r#"{"action": "run", "confidence": 140.0, "processing_time": 1.0}"#,
        ))
        .unwrap_err();
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn test_payload_too_large_is_client_validation() {
        let err = classify(DispatchOutcome::PayloadTooLarge {
            byte_size: 60,
            max_bytes: 50,
        })
        .unwrap_err();
        assert!(matches!(
            err,
            SessionError::ClientValidation(ValidationReason::TooLarge { .. })
        ));
    }

    #[test]
    fn test_unreadable_source_is_client_validation() {
        let err = classify(DispatchOutcome::SourceUnreadable {
            detail: "No such file or directory".to_string(),
        })
        .unwrap_err();
        assert!(matches!(
            err,
            SessionError::ClientValidation(ValidationReason::Unreadable { .. })
        ));
        assert_eq!(err.message(), UNREADABLE_FILE_MESSAGE);
        assert_ne!(err.message(), NETWORK_UNREACHABLE_MESSAGE);
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(SessionError::ServerError {
            status: 415,
            message: "nope".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "server_error");
        assert_eq!(json["detail"]["status"], 415);

        let json = serde_json::to_value(SessionError::Timeout).unwrap();
        assert_eq!(json["kind"], "timeout");
    }
}
