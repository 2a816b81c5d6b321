use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"], catch)]
    async fn invoke(cmd: &str, args: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "event"], catch)]
    async fn listen(
        event: &str,
        handler: &Closure<dyn FnMut(JsValue)>,
    ) -> Result<JsValue, JsValue>;
}

pub const SNAPSHOT_EVENT: &str = "analysis://snapshot";
pub const DRAG_DROP_EVENT: &str = "tauri://drag-drop";
pub const DRAG_ENTER_EVENT: &str = "tauri://drag-enter";
pub const DRAG_LEAVE_EVENT: &str = "tauri://drag-leave";

// -- Arg structs for serialization --

#[derive(Serialize)]
struct SelectVideoArgs {
    path: String,
}

#[derive(Serialize)]
struct DismissNoticeArgs {
    id: Option<u64>,
}

#[derive(Serialize)]
struct GetPreferenceArgs {
    key: String,
}

#[derive(Serialize)]
struct SetPreferenceArgs {
    key: String,
    value: String,
}

// -- Session snapshot matching backend struct --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    #[default]
    Idle,
    Loading,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PredictionResponse {
    pub action: String,
    pub confidence: f64,
    pub processing_time: f64,
}

/// Only the tag is mirrored; the resolved message travels separately.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorKind {
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notice {
    pub id: u64,
    pub message: String,
    pub raised_at: String,
    pub auto_hide_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionSnapshot {
    pub phase: PhaseKind,
    pub file_name: Option<String>,
    pub preview_url: Option<String>,
    pub result: Option<PredictionResponse>,
    pub action_label: Option<String>,
    pub error: Option<ErrorKind>,
    pub error_message: Option<String>,
    pub notice: Option<Notice>,
    pub accepts_files: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: PhaseKind::Idle,
            file_name: None,
            preview_url: None,
            result: None,
            action_label: None,
            error: None,
            error_message: None,
            notice: None,
            accepts_files: true,
        }
    }
}

// -- Service probes matching backend structs --

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub num_classes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionClasses {
    pub classes: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub service_url: String,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: u64,
    pub allowed_extensions: Vec<String>,
    pub notice_auto_hide_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct DragDropPayload {
    paths: Vec<String>,
}

// -- Typed invoke helpers --

fn js_error(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| "Unknown error".to_string())
}

fn no_args() -> Result<JsValue, String> {
    serde_wasm_bindgen::to_value(&serde_json::json!({})).map_err(|e| e.to_string())
}

async fn call<T: DeserializeOwned>(cmd: &str, args: JsValue) -> Result<T, String> {
    let result = invoke(cmd, args).await.map_err(js_error)?;
    serde_wasm_bindgen::from_value(result).map_err(|e| e.to_string())
}

pub async fn get_analysis_snapshot() -> Result<SessionSnapshot, String> {
    call("get_analysis_snapshot", no_args()?).await
}

pub async fn select_video(path: &str) -> Result<SessionSnapshot, String> {
    let args = serde_wasm_bindgen::to_value(&SelectVideoArgs {
        path: path.to_string(),
    })
    .map_err(|e| e.to_string())?;
    call("select_video", args).await
}

pub async fn pick_video() -> Result<Option<SessionSnapshot>, String> {
    call("pick_video", no_args()?).await
}

pub async fn reset_analysis() -> Result<SessionSnapshot, String> {
    call("reset_analysis", no_args()?).await
}

pub async fn dismiss_notice(id: Option<u64>) -> Result<SessionSnapshot, String> {
    let args =
        serde_wasm_bindgen::to_value(&DismissNoticeArgs { id }).map_err(|e| e.to_string())?;
    call("dismiss_notice", args).await
}

pub async fn export_prediction() -> Result<Option<String>, String> {
    call("export_prediction", no_args()?).await
}

pub async fn check_service_health() -> Result<ServiceHealth, String> {
    call("check_service_health", no_args()?).await
}

pub async fn list_action_classes() -> Result<ActionClasses, String> {
    call("list_action_classes", no_args()?).await
}

pub async fn get_analysis_config() -> Result<AnalysisConfig, String> {
    call("get_analysis_config", no_args()?).await
}

pub async fn get_preference(key: &str) -> Result<Option<String>, String> {
    let args = serde_wasm_bindgen::to_value(&GetPreferenceArgs {
        key: key.to_string(),
    })
    .map_err(|e| e.to_string())?;
    call("get_preference", args).await
}

/// Returns whether the running session picked up the change.
pub async fn set_preference(key: &str, value: &str) -> Result<bool, String> {
    let args = serde_wasm_bindgen::to_value(&SetPreferenceArgs {
        key: key.to_string(),
        value: value.to_string(),
    })
    .map_err(|e| e.to_string())?;
    call("set_preference", args).await
}

pub async fn apply_analysis_config() -> Result<AnalysisConfig, String> {
    call("apply_analysis_config", no_args()?).await
}

// -- Event subscriptions --

/// Line shown when an event listener could not be registered.
pub fn subscription_error(what: &str, err: &str) -> String {
    format!("Failed to subscribe to {}: {}", what, err)
}

/// Subscribe to a backend event for the lifetime of the app.
async fn subscribe<T, F>(event: &str, mut handler: F) -> Result<(), String>
where
    T: DeserializeOwned + 'static,
    F: FnMut(T) + 'static,
{
    let name = event.to_string();
    let closure = Closure::<dyn FnMut(JsValue)>::new(move |raw: JsValue| {
        let payload = js_sys::Reflect::get(&raw, &JsValue::from_str("payload"))
            .unwrap_or(JsValue::NULL);
        match serde_wasm_bindgen::from_value::<T>(payload) {
            Ok(value) => handler(value),
            Err(e) => {
                web_sys::console::warn_1(&format!("Bad {} payload: {}", name, e).into());
            }
        }
    });
    listen(event, &closure).await.map_err(js_error)?;
    closure.forget();
    Ok(())
}

pub async fn on_snapshot(handler: impl FnMut(SessionSnapshot) + 'static) -> Result<(), String> {
    subscribe(SNAPSHOT_EVENT, handler).await
}

/// Files dropped onto the window, as absolute paths.
pub async fn on_file_drop(mut handler: impl FnMut(Vec<String>) + 'static) -> Result<(), String> {
    subscribe(DRAG_DROP_EVENT, move |payload: DragDropPayload| handler(payload.paths)).await
}

/// `true` while a drag hovers over the window.
pub async fn on_drag_hover(handler: impl Fn(bool) + Clone + 'static) -> Result<(), String> {
    let enter = handler.clone();
    subscribe(DRAG_ENTER_EVENT, move |_: serde_json::Value| enter(true)).await?;
    subscribe(DRAG_LEAVE_EVENT, move |_: serde_json::Value| handler(false)).await
}
