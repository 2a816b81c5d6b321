use actionlens_core::{ActionClasses, HttpTransport, ServiceHealth};
use tauri::State;
use tracing::{info, warn};

use crate::error::ActionLensError;
use crate::state::AnalysisState;

fn probe_transport(state: &AnalysisState) -> Result<HttpTransport, String> {
    HttpTransport::new(&state.config()).map_err(|e| ActionLensError::from(e).into())
}

#[tauri::command]
pub async fn check_service_health(
    state: State<'_, AnalysisState>,
) -> Result<ServiceHealth, String> {
    let transport = probe_transport(&state)?;
    info!("Checking inference service health");
    transport.health().await.map_err(|e| {
        warn!("Health check failed: {}", e);
        e.message()
    })
}

#[tauri::command]
pub async fn list_action_classes(state: State<'_, AnalysisState>) -> Result<ActionClasses, String> {
    let transport = probe_transport(&state)?;
    let classes = transport.classes().await.map_err(|e| {
        warn!("Failed to list action classes: {}", e);
        e.message()
    })?;
    info!("Service recognises {} actions", classes.count);
    Ok(classes)
}
