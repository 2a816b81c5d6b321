mod commands;
mod error;
mod preview_protocol;
mod state;

use tauri::Manager;
use tracing::warn;

use crate::state::{AnalysisState, PREVIEW_SCHEME};

pub use error::ActionLensError;

pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tauri::Builder::default()
        .plugin(tauri_plugin_store::Builder::new().build())
        .register_asynchronous_uri_scheme_protocol(PREVIEW_SCHEME, preview_protocol::handle)
        .invoke_handler(tauri::generate_handler![
            commands::analysis::get_analysis_snapshot,
            commands::analysis::select_video,
            commands::analysis::pick_video,
            commands::analysis::reset_analysis,
            commands::analysis::dismiss_notice,
            commands::analysis::export_prediction,
            commands::service::check_service_health,
            commands::service::list_action_classes,
            commands::config::get_preference,
            commands::config::set_preference,
            commands::config::apply_analysis_config,
            commands::config::get_analysis_config,
        ])
        .setup(|app| {
            let handle = app.handle();
            let config = state::load_config_or_default(handle);
            let analysis = match AnalysisState::new(handle, config) {
                Ok(analysis) => analysis,
                Err(e) => {
                    warn!("Stored analysis config unusable, using defaults: {}", e);
                    AnalysisState::new(handle, actionlens_core::AnalysisConfig::default())?
                }
            };
            app.manage(analysis);
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
