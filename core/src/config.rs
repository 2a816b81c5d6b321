//! Session and service configuration.
//!
//! Values come from the shell's preference store as strings; anything left
//! unset keeps its default. The client-side size limit is only a fast-fail
//! check: the service's own cap is authoritative.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;
use crate::types::SendParameters;
use crate::validator::{ValidationRules, DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_BYTES};

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_NOTICE_AUTO_HIDE_SECS: u64 = 8;

pub const PREDICT_PATH: &str = "/api/predict";
pub const HEALTH_PATH: &str = "/api/health";
pub const CLASSES_PATH: &str = "/api/classes";

/// Preference keys read by [`AnalysisConfig::from_preferences`].
pub mod keys {
    pub const SERVICE_URL: &str = "service_url";
    pub const REQUEST_TIMEOUT_SECS: &str = "request_timeout_secs";
    pub const MAX_UPLOAD_MB: &str = "max_upload_mb";
    pub const ALLOWED_EXTENSIONS: &str = "allowed_extensions";
    pub const NOTICE_AUTO_HIDE_SECS: &str = "notice_auto_hide_secs";

    pub const ALL: [&str; 5] = [
        SERVICE_URL,
        REQUEST_TIMEOUT_SECS,
        MAX_UPLOAD_MB,
        ALLOWED_EXTENSIONS,
        NOTICE_AUTO_HIDE_SECS,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Base URL of the inference service, without the `/api/...` path.
    pub service_url: String,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: u64,
    /// Lower-case, without the leading dot.
    pub allowed_extensions: Vec<String>,
    pub notice_auto_hide_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            notice_auto_hide_secs: DEFAULT_NOTICE_AUTO_HIDE_SECS,
        }
    }
}

impl AnalysisConfig {
    /// Build a config from string preferences, e.g. a key-value store.
    pub fn from_preferences<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get(keys::SERVICE_URL) {
            config.service_url = url;
        }
        if let Some(secs) = get(keys::REQUEST_TIMEOUT_SECS) {
            config.request_timeout_secs = parse_positive(keys::REQUEST_TIMEOUT_SECS, &secs)?;
        }
        if let Some(mb) = get(keys::MAX_UPLOAD_MB) {
            config.max_upload_bytes = parse_positive(keys::MAX_UPLOAD_MB, &mb)? * 1024 * 1024;
        }
        if let Some(list) = get(keys::ALLOWED_EXTENSIONS) {
            config.allowed_extensions = list
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect();
        }
        if let Some(secs) = get(keys::NOTICE_AUTO_HIDE_SECS) {
            config.notice_auto_hide_secs = parse_positive(keys::NOTICE_AUTO_HIDE_SECS, &secs)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.base_url()?;
        if self.allowed_extensions.is_empty() {
            return Err(CoreError::InvalidConfig(
                "At least one allowed extension is required".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 || self.max_upload_bytes == 0 {
            return Err(CoreError::InvalidConfig(
                "Timeout and upload limit must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, CoreError> {
        let url = Url::parse(&self.service_url).map_err(|e| {
            CoreError::InvalidConfig(format!("Invalid service URL '{}': {}", self.service_url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(CoreError::InvalidConfig(format!(
                "Unsupported service URL scheme '{}'",
                other
            ))),
        }
    }

    /// Absolute URL for one of the service paths.
    pub fn endpoint(&self, path: &str) -> Result<Url, CoreError> {
        let base = self.base_url()?;
        let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
        Url::parse(&joined)
            .map_err(|e| CoreError::InvalidConfig(format!("Invalid endpoint '{}': {}", joined, e)))
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules::new(self.max_upload_bytes, &self.allowed_extensions)
    }

    pub fn send_parameters(&self) -> SendParameters {
        SendParameters {
            timeout: Duration::from_secs(self.request_timeout_secs),
            max_body_bytes: self.max_upload_bytes,
        }
    }

    pub fn notice_auto_hide(&self) -> Duration {
        Duration::from_secs(self.notice_auto_hide_secs)
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64, CoreError> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CoreError::InvalidConfig(format!(
            "'{}' must be a positive integer, got '{}'",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn prefs(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::from_preferences(|_| None).unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.send_parameters().timeout, Duration::from_secs(120));
        assert_eq!(
            config.endpoint(PREDICT_PATH).unwrap().as_str(),
            "http://localhost:5000/api/predict"
        );
    }

    #[test]
    fn test_overrides() {
        let config = AnalysisConfig::from_preferences(prefs(&[
            (keys::SERVICE_URL, "https://infer.example.com/"),
            (keys::REQUEST_TIMEOUT_SECS, "30"),
            (keys::MAX_UPLOAD_MB, "100"),
            (keys::ALLOWED_EXTENSIONS, ".MP4, webm"),
        ]))
        .unwrap();

        assert_eq!(
            config.endpoint(HEALTH_PATH).unwrap().as_str(),
            "https://infer.example.com/api/health"
        );
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.max_upload_bytes, 100 * 1024 * 1024);
        assert_eq!(config.allowed_extensions, vec!["mp4", "webm"]);
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config =
            AnalysisConfig::from_preferences(prefs(&[(keys::SERVICE_URL, "  ")])).unwrap();
        assert_eq!(config.service_url, DEFAULT_SERVICE_URL);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AnalysisConfig::from_preferences(prefs(&[(keys::MAX_UPLOAD_MB, "0")])).is_err());
        assert!(
            AnalysisConfig::from_preferences(prefs(&[(keys::REQUEST_TIMEOUT_SECS, "soon")]))
                .is_err()
        );
        assert!(
            AnalysisConfig::from_preferences(prefs(&[(keys::SERVICE_URL, "ftp://host")])).is_err()
        );
        assert!(
            AnalysisConfig::from_preferences(prefs(&[(keys::ALLOWED_EXTENSIONS, " , ")])).is_err()
        );
    }
}
