use actionlens_core::config::keys;
use actionlens_core::{AnalysisConfig, Reconfigured};
use tauri::{AppHandle, State};
use tauri_plugin_store::StoreExt;
use tracing::{info, warn};

use crate::error::ActionLensError;
use crate::state::{load_config, AnalysisState, PREFERENCES_STORE};

#[tauri::command]
pub fn get_preference(app: AppHandle, key: &str) -> Result<Option<String>, String> {
    info!("Getting preference: {}", key);
    let store = app.store(PREFERENCES_STORE).map_err(|e| {
        warn!("Failed to open store: {}", e);
        e.to_string()
    })?;
    let value = store.get(key).and_then(|v| v.as_str().map(|s| s.to_string()));
    Ok(value)
}

/// Save a preference. Analysis settings are validated before they are
/// stored. They reach the session right away, or once the running analysis
/// finishes or is reset.
///
/// Returns whether the live session picked up the change immediately.
#[tauri::command]
pub fn set_preference(
    app: AppHandle,
    state: State<'_, AnalysisState>,
    key: &str,
    value: &str,
) -> Result<bool, String> {
    info!("Setting preference: {} = {}", key, value);
    let store = app.store(PREFERENCES_STORE).map_err(|e| {
        warn!("Failed to open store: {}", e);
        e.to_string()
    })?;

    let affects_analysis = keys::ALL.contains(&key);
    if affects_analysis {
        AnalysisConfig::from_preferences(|k| {
            if k == key {
                Some(value.to_string())
            } else {
                store.get(k).and_then(|v| v.as_str().map(|s| s.to_string()))
            }
        })
        .map_err(|e| {
            warn!("Rejected {} = {}: {}", key, value, e);
            ActionLensError::from(e)
        })?;
    }

    store.set(key, serde_json::json!(value));
    store.save().map_err(|e| {
        warn!("Failed to save store: {}", e);
        e.to_string()
    })?;

    if !affects_analysis {
        return Ok(false);
    }
    let config = load_config(&app)?;
    let outcome = state.apply_config_when_idle(config)?;
    if outcome == Reconfigured::Deferred {
        info!("Analysis running, {} applies when it finishes", key);
    }
    Ok(outcome == Reconfigured::Applied)
}

/// Reload analysis settings from the store into the live session.
#[tauri::command]
pub fn apply_analysis_config(
    app: AppHandle,
    state: State<'_, AnalysisState>,
) -> Result<AnalysisConfig, String> {
    reapply(&app, &state)?;
    Ok(state.config())
}

#[tauri::command]
pub fn get_analysis_config(state: State<'_, AnalysisState>) -> AnalysisConfig {
    state.config()
}

fn reapply(app: &AppHandle, state: &AnalysisState) -> Result<(), ActionLensError> {
    let config = load_config(app)?;
    state.apply_config(config)
}
