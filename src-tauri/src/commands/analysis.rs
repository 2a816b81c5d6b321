use std::path::PathBuf;

use actionlens_core::export::{export_phase, EXPORT_FILE_NAME};
use actionlens_core::{MediaFile, SessionSnapshot};
use rfd::AsyncFileDialog;
use tauri::State;
use tracing::{info, warn};

use crate::error::ActionLensError;
use crate::state::AnalysisState;

/// Current session state, for a page that mounts mid-analysis.
#[tauri::command]
pub fn get_analysis_snapshot(state: State<'_, AnalysisState>) -> SessionSnapshot {
    state.controller.snapshot()
}

/// Select a video by path, e.g. from a drag-and-drop onto the window.
#[tauri::command]
pub async fn select_video(
    state: State<'_, AnalysisState>,
    path: String,
) -> Result<SessionSnapshot, String> {
    info!("Video selected: {}", path);
    select_path(&state, PathBuf::from(path))
}

/// Open the native file picker, filtered to the allowed extensions.
///
/// Returns `None` when the user cancels.
#[tauri::command]
pub async fn pick_video(
    state: State<'_, AnalysisState>,
) -> Result<Option<SessionSnapshot>, String> {
    if state.controller.is_loading() {
        return Err(actionlens_core::CoreError::Busy.into());
    }

    let extensions = state.config().allowed_extensions;
    let picked = AsyncFileDialog::new()
        .set_title("Select a video to analyze")
        .add_filter("Video", &extensions[..])
        .pick_file()
        .await;

    let Some(handle) = picked else {
        info!("Video picker cancelled");
        return Ok(None);
    };

    select_path(&state, handle.path().to_path_buf()).map(Some)
}

fn select_path(state: &AnalysisState, path: PathBuf) -> Result<SessionSnapshot, String> {
    let file = MediaFile::from_path(&path).map_err(|e| {
        warn!("Cannot use {}: {}", path.display(), e);
        ActionLensError::from(e)
    })?;
    let selection = state
        .controller
        .select_file(file)
        .map_err(ActionLensError::from)?;
    Ok(selection.snapshot)
}

#[tauri::command]
pub fn reset_analysis(state: State<'_, AnalysisState>) -> SessionSnapshot {
    info!("Analysis reset requested");
    state.controller.reset()
}

#[tauri::command]
pub fn dismiss_notice(state: State<'_, AnalysisState>, id: Option<u64>) -> SessionSnapshot {
    state.controller.dismiss_notice(id)
}

/// Save the current result as JSON to a user-chosen path.
///
/// Returns the written path, or `None` when the save dialog is cancelled.
#[tauri::command]
pub async fn export_prediction(state: State<'_, AnalysisState>) -> Result<Option<String>, String> {
    let document = state
        .controller
        .inspect(|session| export_phase(session.phase()))
        .map_err(ActionLensError::from)?;

    let target = AsyncFileDialog::new()
        .set_title("Export prediction")
        .set_file_name(EXPORT_FILE_NAME)
        .add_filter("JSON", &["json"])
        .save_file()
        .await;

    let Some(target) = target else {
        info!("Export cancelled");
        return Ok(None);
    };

    let path = target.path().to_path_buf();
    tokio::fs::write(&path, document)
        .await
        .map_err(ActionLensError::from)?;
    info!("Exported prediction to {}", path.display());
    Ok(Some(path.to_string_lossy().to_string()))
}
