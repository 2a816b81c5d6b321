//! Prediction result: action label, confidence bar, timing and export.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, PredictionResponse};

#[component]
pub fn ResultCard(
    result: PredictionResponse,
    /// Display form of the action, e.g. "Jump Rope"
    #[prop(into)]
    label: String,
) -> impl IntoView {
    let (export_status, set_export_status) = signal::<Option<String>>(None);
    let (exporting, set_exporting) = signal(false);

    let confidence = result.confidence.clamp(0.0, 100.0);
    let bar_class = if confidence >= 80.0 {
        "confidence-fill confidence-high"
    } else if confidence >= 50.0 {
        "confidence-fill confidence-medium"
    } else {
        "confidence-fill confidence-low"
    };

    let on_export = move |_| {
        set_exporting.set(true);
        set_export_status.set(None);
        spawn_local(async move {
            match commands::export_prediction().await {
                Ok(Some(path)) => set_export_status.set(Some(format!("Saved to {}", path))),
                Ok(None) => {}
                Err(e) => set_export_status.set(Some(format!("Export failed: {}", e))),
            }
            set_exporting.set(false);
        });
    };

    view! {
        <div class="result-card">
            <p class="result-caption">"Detected action"</p>
            <h3 class="result-action" title=result.action.clone()>{label}</h3>

            <div class="confidence">
                <div class="confidence-header">
                    <span>"Confidence"</span>
                    <span class="confidence-value">{format!("{:.1}%", confidence)}</span>
                </div>
                <div class="confidence-track">
                    <div class=bar_class style=format!("width: {:.1}%", confidence)></div>
                </div>
            </div>

            <p class="result-timing">
                {format!("Processed in {:.2}s", result.processing_time)}
            </p>

            <button
                class="btn btn-secondary"
                on:click=on_export
                disabled=move || exporting.get()
            >
                {move || if exporting.get() { "Exporting..." } else { "Export JSON" }}
            </button>
            <Show when=move || export_status.get().is_some()>
                <span class="status-text">{move || export_status.get().unwrap_or_default()}</span>
            </Show>
        </div>
    }
}
