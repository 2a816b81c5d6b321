use leptos::prelude::*;

/// Reachability of one part of the inference service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Online,
    Degraded,
    Offline,
    Checking,
}

impl ServiceState {
    fn icon(self) -> &'static str {
        match self {
            ServiceState::Online => "\u{2713}",
            ServiceState::Degraded => "!",
            ServiceState::Offline => "\u{2717}",
            ServiceState::Checking => "\u{2026}",
        }
    }

    fn class(self) -> &'static str {
        match self {
            ServiceState::Online => "status-badge status-pass",
            ServiceState::Degraded => "status-badge status-warn",
            ServiceState::Offline => "status-badge status-fail",
            ServiceState::Checking => "status-badge status-unknown",
        }
    }
}

#[component]
pub fn StatusBadge(
    /// What is being reported on, e.g. "Model"
    #[prop(into)]
    label: String,
    state: ServiceState,
    /// Optional detail text, e.g. the number of classes
    #[prop(optional, into)]
    detail: Option<String>,
) -> impl IntoView {
    view! {
        <div class="health-item">
            <span class=state.class()>{state.icon()}</span>
            <span class="health-name">{label}</span>
            <span class="health-detail">{detail.unwrap_or_default()}</span>
        </div>
    }
}
