//! Client-side constraint checks run before any network activity.
//!
//! The format check is purely lexical: it looks at the extension of the file
//! name and never at the content. A renamed file passes here and is left to
//! the inference service to reject.

use serde::Serialize;

use crate::types::MediaFile;

/// 50 MiB, matching the inference service's request cap.
pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024 * 1024;

pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 3] = ["mp4", "avi", "mov"];

pub const UNREADABLE_FILE_MESSAGE: &str =
    "Could not read the selected file. Please choose it again.";

/// Why a file was refused before upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ValidationReason {
    TooLarge { byte_size: u64, max_bytes: u64 },
    UnsupportedFormat { extension: String, allowed: Vec<String> },
    /// The file vanished or became unreadable between selection and upload.
    Unreadable { detail: String },
}

impl ValidationReason {
    pub fn message(&self) -> String {
        match self {
            ValidationReason::TooLarge { max_bytes, .. } => format!(
                "File too large. Maximum size is {}MB.",
                max_bytes / (1024 * 1024)
            ),
            ValidationReason::UnsupportedFormat { extension, allowed } => {
                let shown = if extension.is_empty() {
                    "unknown".to_string()
                } else {
                    format!(".{}", extension)
                };
                format!(
                    "Unsupported format ({}). Please use {}.",
                    shown,
                    format_allowed(allowed)
                )
            }
            ValidationReason::Unreadable { .. } => UNREADABLE_FILE_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Accepted,
    Rejected(ValidationReason),
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted)
    }
}

/// Size limit and extension allow-list for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    pub max_bytes: u64,
    /// Lower-case extensions without the leading dot.
    pub allowed_extensions: Vec<String>,
}

impl ValidationRules {
    pub fn new<I, S>(max_bytes: u64, allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_extensions = allowed_extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| !ext.is_empty())
            .collect();
        Self {
            max_bytes,
            allowed_extensions,
        }
    }

    pub fn validate(&self, file: &MediaFile) -> ValidationResult {
        validate(file, self.max_bytes, &self.allowed_extensions)
    }
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BYTES, DEFAULT_ALLOWED_EXTENSIONS)
    }
}

/// Check a file against the size limit first, then the extension allow-list.
///
/// `allowed_extensions` entries may be given with or without a leading dot
/// and in any case.
pub fn validate<S: AsRef<str>>(
    file: &MediaFile,
    max_bytes: u64,
    allowed_extensions: &[S],
) -> ValidationResult {
    if file.byte_size() > max_bytes {
        return ValidationResult::Rejected(ValidationReason::TooLarge {
            byte_size: file.byte_size(),
            max_bytes,
        });
    }

    let extension = extension_of(file.name());
    let allowed: Vec<String> = allowed_extensions
        .iter()
        .map(|ext| normalize_extension(ext.as_ref()))
        .collect();

    if extension.is_empty() || !allowed.iter().any(|ext| *ext == extension) {
        return ValidationResult::Rejected(ValidationReason::UnsupportedFormat {
            extension,
            allowed,
        });
    }

    ValidationResult::Accepted
}

/// Lower-cased text after the final `.` of `name`, or empty if there is none.
pub fn extension_of(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// "MP4, AVI, or MOV"
fn format_allowed(allowed: &[String]) -> String {
    let upper: Vec<String> = allowed.iter().map(|ext| ext.to_uppercase()).collect();
    match upper.as_slice() {
        [] => "a supported video format".to_string(),
        [only] => only.clone(),
        [first, second] => format!("{} or {}", first, second),
        [init @ .., last] => format!("{}, or {}", init.join(", "), last),
    }
}
