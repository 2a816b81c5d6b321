//! Data types shared by the validator, the session and the transport.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Where the bytes of a selected file live.
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// A file on local disk, read only when it is dispatched.
    Path(PathBuf),
    /// An in-memory buffer (drag-and-drop payloads, tests).
    Memory(Arc<[u8]>),
}

/// A video the user selected for analysis.
///
/// Immutable once built. Selecting another file supersedes it rather than
/// mutating it.
#[derive(Debug, Clone)]
pub struct MediaFile {
    name: String,
    byte_size: u64,
    declared_mime: String,
    source: MediaSource,
}

impl MediaFile {
    pub fn new(
        name: impl Into<String>,
        byte_size: u64,
        declared_mime: impl Into<String>,
        source: MediaSource,
    ) -> Self {
        Self {
            name: name.into(),
            byte_size,
            declared_mime: declared_mime.into(),
            source,
        }
    }

    /// Build a handle from a path using filesystem metadata only.
    ///
    /// The file content is not read here, so an oversized file costs nothing
    /// beyond a `stat` before it is rejected.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Not a file: {}", path.display()),
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let declared_mime = mime_for_name(&name).to_string();

        Ok(Self {
            name,
            byte_size: metadata.len(),
            declared_mime,
            source: MediaSource::Path(path.to_path_buf()),
        })
    }

    /// Build a handle around bytes already held in memory.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let bytes = bytes.into();
        let declared_mime = mime_for_name(&name).to_string();
        Self {
            byte_size: bytes.len() as u64,
            name,
            declared_mime,
            source: MediaSource::Memory(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn declared_mime(&self) -> &str {
        &self.declared_mime
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    /// Load the full payload for transmission.
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            MediaSource::Path(path) => tokio::fs::read(path).await,
            MediaSource::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// MIME type guessed from the file name. Lexical only, like the validator.
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Successful classification returned by the inference service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Predicted action label, e.g. `"basketball"` or `"jump_rope"`.
    pub action: String,
    /// Confidence in percent, 0 to 100.
    pub confidence: f64,
    /// Server-side processing time in seconds.
    pub processing_time: f64,
}

impl PredictionResponse {
    /// Range checks the decoder cannot express.
    pub fn is_well_formed(&self) -> bool {
        !self.action.trim().is_empty()
            && self.confidence.is_finite()
            && (0.0..=100.0).contains(&self.confidence)
            && self.processing_time.is_finite()
            && self.processing_time >= 0.0
    }

    /// Human-readable label: underscores become spaces, words capitalised.
    pub fn display_label(&self) -> String {
        self.action
            .split(|c: char| c == '_' || c.is_whitespace())
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Identifies one dispatch so its outcome can be matched to the session
/// state it was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DispatchTicket(pub u64);

/// Send-side limits applied to every dispatch of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendParameters {
    pub timeout: Duration,
    pub max_body_bytes: u64,
}

impl Default for SendParameters {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
            max_body_bytes: crate::validator::DEFAULT_MAX_BYTES,
        }
    }
}

/// A validated file ready to be sent, plus its send parameters.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub ticket: DispatchTicket,
    pub file: MediaFile,
    pub timeout: Duration,
    pub max_body_bytes: u64,
}
