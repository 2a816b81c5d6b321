//! Analysis page: pick a video, watch it upload, read the prediction.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::app::SessionContext;
use crate::commands::{self, PhaseKind};
use crate::components::error_notice::ErrorNotice;
use crate::components::result_card::ResultCard;
use crate::components::upload_zone::UploadZone;

#[component]
pub fn AnalysisPage() -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let snapshot = ctx.snapshot;

    let on_reset = move |_| {
        spawn_local(async move {
            match commands::reset_analysis().await {
                Ok(s) => ctx.set_snapshot.set(s),
                Err(e) => ctx.set_intake_error.set(Some(e)),
            }
        });
    };

    let preview = move || {
        snapshot.get().preview_url.map(|src| {
            view! {
                <video class="preview-video" src=src controls=true muted=true></video>
            }
        })
    };

    view! {
        <div class="page analysis-page">
            <h2>"Analyze Video"</h2>
            <p class="page-description">
                "Upload a short clip and the model will tell you which action it shows."
            </p>

            {move || snapshot.get().notice.map(|notice| view! { <ErrorNotice notice=notice /> })}

            {move || {
                let current = snapshot.get();
                match current.phase {
                    PhaseKind::Idle => view! { <UploadZone /> }.into_any(),

                    PhaseKind::Loading => view! {
                        <div class="analyzing-state">
                            {preview}
                            <div class="loading-indicator">
                                <div class="spinner"></div>
                                <p>
                                    {format!(
                                        "Analyzing {}...",
                                        current.file_name.unwrap_or_default(),
                                    )}
                                </p>
                                <p class="hint">"Processing may take up to a couple of minutes"</p>
                            </div>
                        </div>
                    }.into_any(),

                    PhaseKind::Success => {
                        let result = current.result.clone();
                        let label = current.action_label.clone().unwrap_or_default();
                        view! {
                            <div class="analysis-results">
                                {preview}
                                {result.map(|r| view! { <ResultCard result=r label=label /> })}
                                <div class="action-buttons">
                                    <button class="btn btn-secondary" on:click=on_reset>
                                        "Analyze Another Video"
                                    </button>
                                </div>
                            </div>
                        }.into_any()
                    }

                    PhaseKind::Failure => {
                        let message = current.error_message.clone().unwrap_or_default();
                        view! {
                            <div class="error-state">
                                {preview}
                                <div class="error-message">
                                    <h3>"Analysis Failed"</h3>
                                    <p>{message}</p>
                                </div>
                                <UploadZone />
                                <button class="btn btn-secondary" on:click=on_reset>
                                    "Start Over"
                                </button>
                            </div>
                        }.into_any()
                    }
                }
            }}
        </div>
    }
}
