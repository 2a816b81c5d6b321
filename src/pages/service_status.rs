use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, ActionClasses, ServiceHealth};
use crate::components::status_badge::{ServiceState, StatusBadge};

#[component]
pub fn ServiceStatusPage() -> impl IntoView {
    let (checking, set_checking) = signal(false);
    let (health, set_health) = signal::<Option<Result<ServiceHealth, String>>>(None);
    let (classes, set_classes) = signal::<Option<ActionClasses>>(None);
    let (service_url, set_service_url) = signal(String::new());

    let do_check = move || {
        set_checking.set(true);
        spawn_local(async move {
            if let Ok(config) = commands::get_analysis_config().await {
                set_service_url.set(config.service_url);
            }
            let result = commands::check_service_health().await;
            let online = result.is_ok();
            set_health.set(Some(result));
            set_classes.set(if online {
                commands::list_action_classes().await.ok()
            } else {
                None
            });
            set_checking.set(false);
        });
    };

    // Auto-run on mount
    Effect::new(move |_| {
        do_check();
    });

    view! {
        <div class="page health-page">
            <h2>"Service Status"</h2>
            <p class="page-description">
                {move || format!("Inference service at {}", service_url.get())}
            </p>

            <button
                class="btn btn-primary"
                on:click=move |_| do_check()
                disabled=move || checking.get()
            >
                {move || if checking.get() { "Checking..." } else { "Check Again" }}
            </button>

            {move || match health.get() {
                None => view! {
                    <div class="health-results">
                        <StatusBadge label="Service" state=ServiceState::Checking />
                    </div>
                }.into_any(),
                Some(Err(e)) => view! {
                    <div class="health-results">
                        <StatusBadge label="Service" state=ServiceState::Offline detail=e />
                    </div>
                }.into_any(),
                Some(Ok(h)) => {
                    let service_state = if h.status == "healthy" {
                        ServiceState::Online
                    } else {
                        ServiceState::Degraded
                    };
                    let model_state = if h.model_loaded {
                        ServiceState::Online
                    } else {
                        ServiceState::Offline
                    };
                    view! {
                        <div class="health-results">
                            <StatusBadge
                                label="Service"
                                state=service_state
                                detail=h.status.clone()
                            />
                            <StatusBadge
                                label="Model"
                                state=model_state
                                detail=format!("{} action classes", h.num_classes)
                            />
                        </div>
                    }.into_any()
                }
            }}

            {move || classes.get().map(|c| view! {
                <section class="settings-section">
                    <h3>{format!("Recognised actions ({})", c.count)}</h3>
                    <ul class="class-list">
                        {c.classes.into_iter().map(|name| view! { <li>{name}</li> }).collect_view()}
                    </ul>
                </section>
            })}
        </div>
    }
}
