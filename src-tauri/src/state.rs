//! Managed state: the live analysis session and the configuration it runs
//! with.

use std::sync::{Arc, Mutex, PoisonError};

use actionlens_core::{
    AnalysisConfig, HttpTransport, Observer, PreviewRegistry, Reconfigured, SessionController,
    SessionSettings, SessionSnapshot,
};
use tauri::{AppHandle, Emitter, Runtime};
use tauri_plugin_store::StoreExt;
use tracing::{info, warn};

use crate::error::ActionLensError;

pub const PREFERENCES_STORE: &str = "preferences.json";

/// Event carrying a [`SessionSnapshot`] after every session transition.
pub const SNAPSHOT_EVENT: &str = "analysis://snapshot";

/// Scheme the webview loads selected-video previews from.
pub const PREVIEW_SCHEME: &str = "preview";

/// Base URL of the preview scheme as the webview addresses it.
pub fn preview_base() -> &'static str {
    if cfg!(windows) {
        "http://preview.localhost"
    } else {
        "preview://localhost"
    }
}

pub struct AnalysisState {
    pub controller: SessionController<HttpTransport>,
    pub previews: PreviewRegistry,
    config: Mutex<AnalysisConfig>,
}

impl AnalysisState {
    pub fn new<R: Runtime>(
        app: &AppHandle<R>,
        config: AnalysisConfig,
    ) -> Result<Self, ActionLensError> {
        let previews = PreviewRegistry::new(preview_base());
        let transport = HttpTransport::new(&config)?;
        let controller = SessionController::new(
            SessionSettings::from(&config),
            previews.clone(),
            transport,
            snapshot_emitter(app.clone()),
        );

        info!("Analysis session ready, service at {}", config.service_url);
        Ok(Self {
            controller,
            previews,
            config: Mutex::new(config),
        })
    }

    pub fn config(&self) -> AnalysisConfig {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new configuration. Fails while an analysis is running.
    pub fn apply_config(&self, config: AnalysisConfig) -> Result<(), ActionLensError> {
        let transport = HttpTransport::new(&config)?;
        self.controller
            .reconfigure(SessionSettings::from(&config), transport)?;
        info!(
            "Applied config: service {}, timeout {}s, limit {} bytes",
            config.service_url, config.request_timeout_secs, config.max_upload_bytes
        );
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    /// Swap in a new configuration, holding it until the running analysis
    /// ends if there is one. [`config`](Self::config) reports the new values
    /// straight away.
    pub fn apply_config_when_idle(
        &self,
        config: AnalysisConfig,
    ) -> Result<Reconfigured, ActionLensError> {
        let transport = HttpTransport::new(&config)?;
        let outcome = self
            .controller
            .reconfigure_when_idle(SessionSettings::from(&config), transport);
        match outcome {
            Reconfigured::Applied => info!("Applied config: service {}", config.service_url),
            Reconfigured::Deferred => info!("Config held until the running analysis ends"),
        }
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(outcome)
    }
}

fn snapshot_emitter<R: Runtime>(app: AppHandle<R>) -> Observer {
    Arc::new(move |snapshot: &SessionSnapshot| {
        if let Err(e) = app.emit(SNAPSHOT_EVENT, snapshot) {
            warn!("Failed to emit session snapshot: {}", e);
        }
    })
}

/// Read the analysis config from the preference store.
pub fn load_config<R: Runtime>(app: &AppHandle<R>) -> Result<AnalysisConfig, ActionLensError> {
    let store = app.store(PREFERENCES_STORE)?;
    let config = AnalysisConfig::from_preferences(|key| {
        store.get(key).and_then(|v| v.as_str().map(|s| s.to_string()))
    })?;
    Ok(config)
}

/// Like [`load_config`], but falls back to defaults when the stored values
/// are unusable.
pub fn load_config_or_default<R: Runtime>(app: &AppHandle<R>) -> AnalysisConfig {
    load_config(app).unwrap_or_else(|e| {
        warn!("Using default analysis config: {}", e);
        AnalysisConfig::default()
    })
}
