use leptos::prelude::*;
use leptos_router::components::*;
use leptos_router::path;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, SessionSnapshot};
use crate::components::sidebar::Sidebar;
use crate::pages::analysis::AnalysisPage;
use crate::pages::service_status::ServiceStatusPage;
use crate::pages::settings::SettingsPage;

/// Session state shared by every page, kept current by backend events.
#[derive(Clone, Copy)]
pub struct SessionContext {
    pub snapshot: ReadSignal<SessionSnapshot>,
    pub set_snapshot: WriteSignal<SessionSnapshot>,
    /// A file is being dragged over the window.
    pub drag_hover: ReadSignal<bool>,
    /// Last refusal from the backend when handing over a file.
    pub intake_error: ReadSignal<Option<String>>,
    pub set_intake_error: WriteSignal<Option<String>>,
}

impl SessionContext {
    /// Hand a path to the backend unless an analysis is running.
    pub fn select_path(&self, path: String) {
        if !self.snapshot.get_untracked().accepts_files {
            return;
        }
        let ctx = *self;
        ctx.set_intake_error.set(None);
        spawn_local(async move {
            match commands::select_video(&path).await {
                Ok(snapshot) => ctx.set_snapshot.set(snapshot),
                Err(e) => ctx.set_intake_error.set(Some(e)),
            }
        });
    }
}

#[component]
pub fn App() -> impl IntoView {
    let (snapshot, set_snapshot) = signal(SessionSnapshot::default());
    let (drag_hover, set_drag_hover) = signal(false);
    let (intake_error, set_intake_error) = signal::<Option<String>>(None);
    let ctx = SessionContext {
        snapshot,
        set_snapshot,
        drag_hover,
        intake_error,
        set_intake_error,
    };
    provide_context(ctx);

    // Subscribe to backend events once, then pull the current state
    Effect::new(move |_| {
        spawn_local(async move {
            let report = move |what: &str, e: String| {
                let message = commands::subscription_error(what, &e);
                web_sys::console::warn_1(&message.clone().into());
                set_intake_error.set(Some(message));
            };

            if let Err(e) = commands::on_snapshot(move |s| set_snapshot.set(s)).await {
                report("session updates", e);
            }
            if let Err(e) = commands::on_drag_hover(move |over| set_drag_hover.set(over)).await {
                report("drag and drop", e);
            }
            let dropped = commands::on_file_drop(move |paths| {
                set_drag_hover.set(false);
                if let Some(path) = paths.into_iter().next() {
                    ctx.select_path(path);
                }
            })
            .await;
            if let Err(e) = dropped {
                report("dropped files", e);
            }

            if let Ok(current) = commands::get_analysis_snapshot().await {
                set_snapshot.set(current);
            }
        });
    });

    view! {
        <Router>
            <div class="app-layout">
                <Sidebar />
                <main class="content">
                    <Routes fallback=|| view! { <p>"Page not found"</p> }>
                        <Route path=path!("/") view=AnalysisPage />
                        <Route path=path!("/service") view=ServiceStatusPage />
                        <Route path=path!("/settings") view=SettingsPage />
                    </Routes>
                </main>
            </div>
        </Router>
    }
}
