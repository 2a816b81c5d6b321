//! Async driver around [`AnalysisSession`].
//!
//! The controller owns the session behind a single mutex, together with the
//! transport it dispatches through and the handle of the task doing so. Each
//! dispatch runs as a spawned tokio task. A [`SessionSnapshot`] is pushed to
//! the observer after every transition, in the order the transitions happen.
//! The lock is never held across an await.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::classify::{classify, DispatchOutcome};
use crate::error::CoreError;
use crate::preview::PreviewRegistry;
use crate::session::{AnalysisSession, Phase, Selection, SessionSettings, SessionSnapshot};
use crate::transport::InferenceTransport;
use crate::types::{DispatchTicket, MediaFile, PredictionRequest};

/// Receives a snapshot after every state change.
///
/// Called with the session lock held, so it must not call back into the
/// controller.
pub type Observer = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

/// What a call to [`SessionController::select_file`] started.
pub struct SelectionHandle {
    /// State right after validation: `Loading` or `Failure`.
    pub snapshot: SessionSnapshot,
    /// The dispatch task, when the file was accepted.
    pub dispatch: Option<JoinHandle<()>>,
}

/// How [`SessionController::reconfigure_when_idle`] handled new settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconfigured {
    Applied,
    /// Held until the running analysis finishes or is reset.
    Deferred,
}

struct State<T> {
    session: AnalysisSession,
    transport: Arc<T>,
    pending: Option<(SessionSettings, Arc<T>)>,
    dispatch_task: Option<(DispatchTicket, AbortHandle)>,
}

impl<T> State<T> {
    /// Remove the stored task handle if it belongs to `ticket`.
    fn take_task(&mut self, ticket: DispatchTicket) -> Option<AbortHandle> {
        match &self.dispatch_task {
            Some((owner, _)) if *owner == ticket => {
                self.dispatch_task.take().map(|(_, handle)| handle)
            }
            _ => None,
        }
    }

    fn install(&mut self, settings: SessionSettings, transport: Arc<T>) -> Result<(), CoreError> {
        self.session.reconfigure(settings)?;
        self.transport = transport;
        Ok(())
    }

    fn apply_pending(&mut self) {
        let Some((settings, transport)) = self.pending.take() else {
            return;
        };
        match self.install(settings, transport) {
            Ok(()) => info!("Deferred settings applied"),
            Err(e) => warn!("Dropping deferred settings: {}", e),
        }
    }
}

pub struct SessionController<T: InferenceTransport> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    observer: Observer,
}

impl<T: InferenceTransport> Clone for SessionController<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: InferenceTransport> SessionController<T> {
    pub fn new(
        settings: SessionSettings,
        previews: PreviewRegistry,
        transport: T,
        observer: Observer,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    session: AnalysisSession::new(settings, previews),
                    transport: Arc::new(transport),
                    pending: None,
                    dispatch_task: None,
                }),
                observer,
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock_state().session.snapshot()
    }

    /// Run `f` against the session state without changing it.
    pub fn inspect<R>(&self, f: impl FnOnce(&AnalysisSession) -> R) -> R {
        f(&self.lock_state().session)
    }

    /// Apply new settings and transport. Refused while a request is in flight.
    pub fn reconfigure(&self, settings: SessionSettings, transport: T) -> Result<(), CoreError> {
        let mut state = self.lock_state();
        state.install(settings, Arc::new(transport))?;
        state.pending = None;
        info!("Session reconfigured");
        Ok(())
    }

    /// Like [`reconfigure`](Self::reconfigure), but while a request is in
    /// flight the new settings are held and installed as soon as the session
    /// leaves `Loading`. A later call replaces any settings still held.
    pub fn reconfigure_when_idle(&self, settings: SessionSettings, transport: T) -> Reconfigured {
        let mut state = self.lock_state();
        let transport = Arc::new(transport);
        match state.session.reconfigure(settings.clone()) {
            Ok(()) => {
                state.transport = transport;
                state.pending = None;
                info!("Session reconfigured");
                Reconfigured::Applied
            }
            Err(_) => {
                debug!("Analysis running, holding new settings");
                state.pending = Some((settings, transport));
                Reconfigured::Deferred
            }
        }
    }

    /// True while settings are held for the end of the running analysis.
    pub fn has_pending_settings(&self) -> bool {
        self.lock_state().pending.is_some()
    }

    /// True while a dispatch is outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(self.lock_state().session.phase(), Phase::Loading)
    }

    /// Forward a file selection. Must be called from within a tokio runtime:
    /// both the dispatch and the notice timer are spawned tasks.
    ///
    /// The dispatch task is registered before the lock is released, so a
    /// [`reset`](Self::reset) that observes `Loading` can always abort it.
    pub fn select_file(&self, file: MediaFile) -> Result<SelectionHandle, CoreError> {
        let mut state = self.lock_state();
        let selection = state.session.select_file(file)?;
        let snapshot = state.session.snapshot();

        let dispatch = match selection {
            Selection::Dispatch(request) => {
                let ticket = request.ticket;
                let handle = self.spawn_dispatch(Arc::clone(&state.transport), request);
                state.dispatch_task = Some((ticket, handle.abort_handle()));
                Some(handle)
            }
            Selection::Rejected(_) => {
                self.schedule_notice_expiry(&snapshot);
                None
            }
        };
        self.notify(&snapshot);

        Ok(SelectionHandle { snapshot, dispatch })
    }

    /// Return to idle. A dispatch still in flight is aborted and its outcome,
    /// should it still arrive, is ignored.
    pub fn reset(&self) -> SessionSnapshot {
        let mut state = self.lock_state();
        if let Some(ticket) = state.session.reset() {
            if let Some(task) = state.take_task(ticket) {
                debug!("Aborting dispatch {}", ticket.0);
                task.abort();
            }
        }
        state.apply_pending();

        let snapshot = state.session.snapshot();
        self.notify(&snapshot);
        snapshot
    }

    pub fn dismiss_notice(&self, id: Option<u64>) -> SessionSnapshot {
        let mut state = self.lock_state();
        let changed = state.session.dismiss_notice(id);
        let snapshot = state.session.snapshot();
        if changed {
            self.notify(&snapshot);
        }
        snapshot
    }

    fn spawn_dispatch(&self, transport: Arc<T>, request: PredictionRequest) -> JoinHandle<()> {
        let controller = self.clone();

        tokio::spawn(async move {
            let ticket = request.ticket;
            let sent = tokio::time::timeout(request.timeout, transport.predict(&request));
            let outcome = match sent.await {
                Ok(outcome) => outcome,
                Err(_) => DispatchOutcome::DeadlineExceeded,
            };
            let result = classify(outcome);

            let mut state = controller.lock_state();
            if !state.session.resolve(ticket, result) {
                return;
            }
            state.take_task(ticket);
            state.apply_pending();

            let snapshot = state.session.snapshot();
            controller.notify(&snapshot);
            controller.schedule_notice_expiry(&snapshot);
        })
    }

    /// Hide the current notice once its display time has passed.
    fn schedule_notice_expiry(&self, snapshot: &SessionSnapshot) {
        let Some(notice) = snapshot.notice.as_ref() else {
            return;
        };
        let id = notice.id;
        let after = Duration::from_millis(notice.auto_hide_ms);
        let controller = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            debug!("Notice {} expired", id);
            controller.dismiss_notice(Some(id));
        });
    }

    fn notify(&self, snapshot: &SessionSnapshot) {
        (self.shared.observer)(snapshot);
    }

    fn lock_state(&self) -> MutexGuard<'_, State<T>> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
