use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands;

/// One stored preference with its own input and save button.
#[component]
fn PreferenceField(
    #[prop(into)] label: String,
    /// Store key, e.g. "service_url"
    pref_key: &'static str,
    #[prop(into)] placeholder: String,
    #[prop(optional, into)] hint: Option<String>,
) -> impl IntoView {
    let (value, set_value) = signal(String::new());
    let (status, set_status) = signal::<Option<String>>(None);

    Effect::new(move |_| {
        spawn_local(async move {
            match commands::get_preference(pref_key).await {
                Ok(Some(v)) => set_value.set(v),
                Ok(None) => {}
                Err(e) => set_status.set(Some(format!("Failed to load preference: {}", e))),
            }
        });
    });

    let save = move |_| {
        let v = value.get();
        spawn_local(async move {
            match commands::set_preference(pref_key, &v).await {
                Ok(true) => set_status.set(Some("Saved".to_string())),
                Ok(false) => set_status.set(Some(
                    "Saved. Takes effect once the current analysis finishes.".to_string(),
                )),
                Err(e) => set_status.set(Some(format!("Failed to save: {}", e))),
            }
        });
    };

    view! {
        <div class="form-group">
            <label for=pref_key>{label}</label>
            <div class="input-row">
                <input
                    id=pref_key
                    type="text"
                    placeholder=placeholder
                    class="input"
                    prop:value=move || value.get()
                    on:input=move |ev| set_value.set(event_target_value(&ev))
                />
                <button class="btn btn-save" on:click=save>"Save"</button>
            </div>
            {hint.map(|h| view! { <p class="input-hint">{h}</p> })}
            <Show when=move || status.get().is_some()>
                <span class="status-text">{move || status.get().unwrap_or_default()}</span>
            </Show>
        </div>
    }
}

#[component]
pub fn SettingsPage() -> impl IntoView {
    let (apply_status, set_apply_status) = signal::<Option<String>>(None);

    let reapply = move |_| {
        spawn_local(async move {
            match commands::apply_analysis_config().await {
                Ok(config) => set_apply_status.set(Some(format!(
                    "Using {} with a {}s timeout",
                    config.service_url, config.request_timeout_secs
                ))),
                Err(e) => set_apply_status.set(Some(format!("Could not apply settings: {}", e))),
            }
        });
    };

    view! {
        <div class="page settings-page">
            <h2>"Settings"</h2>

            <section class="settings-section">
                <h3>"Inference Service"</h3>
                <p class="section-description">"Where videos are sent for classification."</p>

                <PreferenceField
                    label="Service URL"
                    pref_key="service_url"
                    placeholder="http://localhost:5000"
                />
                <PreferenceField
                    label="Request Timeout (seconds)"
                    pref_key="request_timeout_secs"
                    placeholder="120"
                />
            </section>

            <section class="settings-section">
                <h3>"Uploads"</h3>
                <p class="section-description">
                    "Checks applied before a video leaves this machine."
                </p>

                <PreferenceField
                    label="Maximum Upload Size (MB)"
                    pref_key="max_upload_mb"
                    placeholder="50"
                    hint="The service enforces its own limit as well."
                />
                <PreferenceField
                    label="Allowed Extensions"
                    pref_key="allowed_extensions"
                    placeholder="mp4, avi, mov"
                    hint="Comma separated."
                />
                <PreferenceField
                    label="Error Display Time (seconds)"
                    pref_key="notice_auto_hide_secs"
                    placeholder="8"
                />
            </section>

            <div class="action-buttons">
                <button class="btn btn-secondary" on:click=reapply>"Reapply Settings"</button>
                <Show when=move || apply_status.get().is_some()>
                    <span class="status-text">
                        {move || apply_status.get().unwrap_or_default()}
                    </span>
                </Show>
            </div>
        </div>
    }
}
