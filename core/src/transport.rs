//! Dispatch of prediction requests to the inference service.
//!
//! Transports report what they observed as a [`DispatchOutcome`]; reqwest
//! errors are translated here and never leave this module.

use std::future::Future;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use url::Url;

use crate::classify::{classify_json, DispatchOutcome, SessionError};
use crate::config::{AnalysisConfig, CLASSES_PATH, HEALTH_PATH, PREDICT_PATH};
use crate::error::CoreError;
use crate::types::PredictionRequest;

/// Multipart field the service reads the video from.
pub const VIDEO_FIELD: &str = "video";

const USER_AGENT: &str = "ActionLens/0.1";
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can carry one prediction request to the service.
pub trait InferenceTransport: Send + Sync + 'static {
    fn predict(
        &self,
        request: &PredictionRequest,
    ) -> impl Future<Output = DispatchOutcome> + Send;
}

/// `GET /api/health` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub num_classes: usize,
}

/// `GET /api/classes` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionClasses {
    pub classes: Vec<String>,
    pub count: usize,
}

/// reqwest-backed transport speaking the service's HTTP contract.
pub struct HttpTransport {
    client: reqwest::Client,
    predict_url: Url,
    health_url: Url,
    classes_url: Url,
    /// Largest response body accepted before it is treated as malformed.
    response_cap: u64,
}

impl HttpTransport {
    pub fn new(config: &AnalysisConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            predict_url: config.endpoint(PREDICT_PATH)?,
            health_url: config.endpoint(HEALTH_PATH)?,
            classes_url: config.endpoint(CLASSES_PATH)?,
            response_cap: config.max_upload_bytes,
        })
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }

    pub async fn health(&self) -> Result<ServiceHealth, SessionError> {
        classify_json(self.probe(&self.health_url).await)
    }

    pub async fn classes(&self) -> Result<ActionClasses, SessionError> {
        classify_json(self.probe(&self.classes_url).await)
    }

    async fn probe(&self, url: &Url) -> DispatchOutcome {
        debug!("Probing {}", url);
        match self
            .client
            .get(url.clone())
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => read_response(response, self.response_cap).await,
            Err(e) => outcome_for_error(&e),
        }
    }
}

impl InferenceTransport for HttpTransport {
    async fn predict(&self, request: &PredictionRequest) -> DispatchOutcome {
        let file = &request.file;
        let bytes = match file.read_bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to read {} for upload: {}", file.name(), e);
                return DispatchOutcome::SourceUnreadable {
                    detail: e.to_string(),
                };
            }
        };

        let byte_size = bytes.len() as u64;
        if byte_size > request.max_body_bytes {
            error!(
                "{} grew to {} bytes after validation, cap is {}",
                file.name(),
                byte_size,
                request.max_body_bytes
            );
            return DispatchOutcome::PayloadTooLarge {
                byte_size,
                max_bytes: request.max_body_bytes,
            };
        }

        let part = match Part::bytes(bytes)
            .file_name(file.name().to_string())
            .mime_str(file.declared_mime())
        {
            Ok(part) => part,
            Err(e) => {
                error!("Invalid MIME type '{}': {}", file.declared_mime(), e);
                return DispatchOutcome::NoResponse;
            }
        };
        let form = Form::new().part(VIDEO_FIELD, part);

        info!(
            "Uploading {} ({} bytes) to {}",
            file.name(),
            byte_size,
            self.predict_url
        );
        let sent = self
            .client
            .post(self.predict_url.clone())
            .timeout(request.timeout)
            .multipart(form)
            .send()
            .await;

        match sent {
            Ok(response) => read_response(response, self.response_cap).await,
            Err(e) => outcome_for_error(&e),
        }
    }
}

async fn read_response(response: reqwest::Response, cap: u64) -> DispatchOutcome {
    let status = response.status().as_u16();
    debug!("Service answered {}", status);

    if response.content_length().is_some_and(|len| len > cap) {
        error!("Response body over {} bytes, discarding", cap);
        return DispatchOutcome::Response {
            status,
            body: Vec::new(),
        };
    }

    match response.bytes().await {
        Ok(body) if body.len() as u64 > cap => {
            error!("Response body over {} bytes, discarding", cap);
            DispatchOutcome::Response {
                status,
                body: Vec::new(),
            }
        }
        Ok(body) => DispatchOutcome::Response {
            status,
            body: body.to_vec(),
        },
        Err(e) if e.is_timeout() => {
            error!("Timed out reading response body: {}", e);
            DispatchOutcome::DeadlineExceeded
        }
        Err(e) => {
            error!("Failed to read response body: {}", e);
            DispatchOutcome::Response {
                status,
                body: Vec::new(),
            }
        }
    }
}

fn outcome_for_error(e: &reqwest::Error) -> DispatchOutcome {
    if e.is_connect() {
        error!("Inference service unreachable: {}", e);
        DispatchOutcome::NoResponse
    } else if e.is_timeout() {
        error!("Inference request timed out: {}", e);
        DispatchOutcome::DeadlineExceeded
    } else {
        error!("Inference request failed before a response: {}", e);
        DispatchOutcome::NoResponse
    }
}
