//! Drop target and browse button for choosing a video.
//!
//! Files dropped anywhere on the window arrive as Tauri drag-drop events and
//! are handled in `App`; this component only reflects the hover state.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::app::SessionContext;
use crate::commands;

#[component]
pub fn UploadZone() -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let (formats, set_formats) = signal(String::from("MP4, AVI, MOV"));
    let (max_mb, set_max_mb) = signal(50u64);

    Effect::new(move |_| {
        spawn_local(async move {
            if let Ok(config) = commands::get_analysis_config().await {
                set_formats.set(
                    config
                        .allowed_extensions
                        .iter()
                        .map(|ext| ext.to_uppercase())
                        .collect::<Vec<_>>()
                        .join(", "),
                );
                set_max_mb.set(config.max_upload_bytes / (1024 * 1024));
            }
        });
    });

    let disabled = move || !ctx.snapshot.get().accepts_files;

    let on_browse = move |_| {
        ctx.set_intake_error.set(None);
        spawn_local(async move {
            match commands::pick_video().await {
                Ok(Some(snapshot)) => ctx.set_snapshot.set(snapshot),
                Ok(None) => {}
                Err(e) => ctx.set_intake_error.set(Some(e)),
            }
        });
    };

    view! {
        <div
            class="drop-zone"
            class:drop-zone-active=move || ctx.drag_hover.get() && !disabled()
            class:drop-zone-disabled=disabled
        >
            <div class="drop-zone-content">
                <div class="drop-icon">"[video]"</div>
                <p class="drop-main">"Drop a video here"</p>
                <p class="drop-hint">"or"</p>
                <button class="btn btn-secondary" on:click=on_browse disabled=disabled>
                    "Browse Files"
                </button>
                <p class="drop-formats">
                    {move || format!("Supports {} up to {}MB", formats.get(), max_mb.get())}
                </p>
            </div>
            {move || ctx.intake_error.get().map(|e| view! {
                <p class="status-text status-error">{e}</p>
            })}
        </div>
    }
}
