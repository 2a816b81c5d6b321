//! The upload-validate-submit-result state machine for one analysis.
//!
//! `AnalysisSession` performs no I/O. Selecting a file either fails locally
//! or hands back a [`PredictionRequest`] for the caller to dispatch; the
//! outcome is fed back with [`AnalysisSession::resolve`]. Outcomes are
//! matched by [`DispatchTicket`], so one that arrives after a reset or for a
//! superseded dispatch is dropped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::SessionError;
use crate::config::AnalysisConfig;
use crate::error::CoreError;
use crate::preview::{PreviewHandle, PreviewRegistry};
use crate::types::{
    DispatchTicket, MediaFile, PredictionRequest, PredictionResponse, SendParameters,
};
use crate::validator::{ValidationReason, ValidationResult, ValidationRules};

/// Current state. `Validating` is instantaneous and never observable.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Loading,
    Success(PredictionResponse),
    Failure(SessionError),
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::Loading => PhaseKind::Loading,
            Phase::Success(_) => PhaseKind::Success,
            Phase::Failure(_) => PhaseKind::Failure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Idle,
    Loading,
    Success,
    Failure,
}

/// Dismissible presentation of the current error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub message: String,
    pub raised_at: DateTime<Utc>,
    pub auto_hide_ms: u64,
}

/// Read-only view handed to the presentation layer after every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: PhaseKind,
    pub file_name: Option<String>,
    pub preview_url: Option<String>,
    pub result: Option<PredictionResponse>,
    pub action_label: Option<String>,
    pub error: Option<SessionError>,
    pub error_message: Option<String>,
    pub notice: Option<Notice>,
    /// False while a request is in flight; file intake must be disabled.
    pub accepts_files: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub rules: ValidationRules,
    pub send: SendParameters,
    pub notice_auto_hide: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for SessionSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            rules: config.validation_rules(),
            send: config.send_parameters(),
            notice_auto_hide: config.notice_auto_hide(),
        }
    }
}

/// Result of a file selection that was allowed to run.
#[derive(Debug, Clone)]
pub enum Selection {
    /// Refused by the validator; the session is now in `Failure`.
    Rejected(ValidationReason),
    /// Accepted; the session is `Loading` and this request must be sent.
    Dispatch(PredictionRequest),
}

pub struct AnalysisSession {
    settings: SessionSettings,
    previews: PreviewRegistry,
    phase: Phase,
    file: Option<MediaFile>,
    preview: Option<PreviewHandle>,
    in_flight: Option<DispatchTicket>,
    notice: Option<Notice>,
    next_ticket: u64,
    next_notice: u64,
}

impl AnalysisSession {
    pub fn new(settings: SessionSettings, previews: PreviewRegistry) -> Self {
        Self {
            settings,
            previews,
            phase: Phase::Idle,
            file: None,
            preview: None,
            in_flight: None,
            notice: None,
            next_ticket: 0,
            next_notice: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    pub fn in_flight(&self) -> Option<DispatchTicket> {
        self.in_flight
    }

    pub fn file(&self) -> Option<&MediaFile> {
        self.file.as_ref()
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Swap limits and timeouts. Refused while a request is in flight so a
    /// dispatch never runs under settings it was not issued with.
    pub fn reconfigure(&mut self, settings: SessionSettings) -> Result<(), CoreError> {
        if self.is_loading() {
            return Err(CoreError::Busy);
        }
        self.settings = settings;
        Ok(())
    }

    /// Handle a newly selected file.
    ///
    /// Any previous preview, result, error and notice are discarded before
    /// validation runs. Fails with [`CoreError::Busy`] while `Loading`.
    pub fn select_file(&mut self, file: MediaFile) -> Result<Selection, CoreError> {
        if self.is_loading() {
            warn!("Ignoring selection of {} while an analysis is running", file.name());
            return Err(CoreError::Busy);
        }

        self.clear_attachments();

        match self.settings.rules.validate(&file) {
            ValidationResult::Rejected(reason) => {
                warn!("Rejected {}: {}", file.name(), reason.message());
                self.fail(SessionError::ClientValidation(reason.clone()));
                Ok(Selection::Rejected(reason))
            }
            ValidationResult::Accepted => {
                self.next_ticket += 1;
                let ticket = DispatchTicket(self.next_ticket);
                let request = PredictionRequest {
                    ticket,
                    file: file.clone(),
                    timeout: self.settings.send.timeout,
                    max_body_bytes: self.settings.send.max_body_bytes,
                };

                self.preview = Some(self.previews.acquire(&file));
                info!(
                    "Accepted {} ({} bytes), dispatch {}",
                    file.name(),
                    file.byte_size(),
                    ticket.0
                );
                self.file = Some(file);
                self.in_flight = Some(ticket);
                self.phase = Phase::Loading;
                Ok(Selection::Dispatch(request))
            }
        }
    }

    /// Apply the outcome of a dispatch.
    ///
    /// Returns false, changing nothing, if `ticket` is not the request
    /// currently in flight.
    pub fn resolve(
        &mut self,
        ticket: DispatchTicket,
        outcome: Result<PredictionResponse, SessionError>,
    ) -> bool {
        if self.in_flight != Some(ticket) {
            debug!("Dropping outcome of abandoned dispatch {}", ticket.0);
            return false;
        }

        self.in_flight = None;
        match outcome {
            Ok(response) => {
                info!(
                    "Dispatch {} succeeded: {} ({:.1}%)",
                    ticket.0, response.action, response.confidence
                );
                self.phase = Phase::Success(response);
            }
            Err(error) => {
                warn!("Dispatch {} failed: {}", ticket.0, error);
                self.fail(error);
            }
        }
        true
    }

    /// Return to `Idle`, releasing the preview and discarding any result or
    /// error. Returns the ticket of a dispatch abandoned by this reset.
    pub fn reset(&mut self) -> Option<DispatchTicket> {
        let abandoned = self.in_flight.take();
        if let Some(ticket) = abandoned {
            info!("Reset abandons dispatch {}", ticket.0);
        }
        self.clear_attachments();
        abandoned
    }

    /// Hide the notice. With `Some(id)`, only that notice is hidden, so a
    /// late timer cannot hide a newer one. Returns true if something changed.
    pub fn dismiss_notice(&mut self, id: Option<u64>) -> bool {
        match (&self.notice, id) {
            (Some(notice), Some(id)) if notice.id != id => false,
            (Some(_), _) => {
                self.notice = None;
                true
            }
            (None, _) => false,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let (result, error) = match &self.phase {
            Phase::Success(response) => (Some(response.clone()), None),
            Phase::Failure(error) => (None, Some(error.clone())),
            _ => (None, None),
        };

        SessionSnapshot {
            phase: self.phase.kind(),
            file_name: self.file.as_ref().map(|f| f.name().to_string()),
            preview_url: self.preview.as_ref().map(|p| p.url().to_string()),
            action_label: result.as_ref().map(PredictionResponse::display_label),
            error_message: error.as_ref().map(SessionError::message),
            result,
            error,
            notice: self.notice.clone(),
            accepts_files: !self.is_loading(),
        }
    }

    fn fail(&mut self, error: SessionError) {
        self.next_notice += 1;
        self.notice = Some(Notice {
            id: self.next_notice,
            message: error.message(),
            raised_at: Utc::now(),
            auto_hide_ms: self.settings.notice_auto_hide.as_millis() as u64,
        });
        self.phase = Phase::Failure(error);
    }

    /// Exit action shared by replacement and reset.
    fn clear_attachments(&mut self) {
        if let Some(handle) = self.preview.take() {
            self.previews.release(handle);
        }
        self.file = None;
        self.notice = None;
        self.phase = Phase::Idle;
    }
}
