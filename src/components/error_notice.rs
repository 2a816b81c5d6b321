//! Dismissible banner for the current failure.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::app::SessionContext;
use crate::commands::{self, Notice};

#[component]
pub fn ErrorNotice(notice: Notice) -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let id = notice.id;

    let on_dismiss = move |_| {
        spawn_local(async move {
            if let Ok(snapshot) = commands::dismiss_notice(Some(id)).await {
                ctx.set_snapshot.set(snapshot);
            }
        });
    };

    view! {
        <div class="error-notice" role="alert">
            <span class="error-notice-icon">"!"</span>
            <span class="error-notice-text">{notice.message}</span>
            <button class="error-notice-close" title="Dismiss" on:click=on_dismiss>
                "\u{00d7}"
            </button>
        </div>
    }
}
