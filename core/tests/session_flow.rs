use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actionlens_core::classify::NETWORK_GENERIC_MESSAGE;
use actionlens_core::*;

const MIB: u64 = 1024 * 1024;

enum Script {
    Respond(DispatchOutcome),
    Stall,
}

#[derive(Default)]
struct Calls {
    scripts: Mutex<VecDeque<Script>>,
    started: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

/// Transport that plays back canned outcomes in order.
#[derive(Clone)]
struct ScriptedTransport(Arc<Calls>);

impl ScriptedTransport {
    fn new(scripts: Vec<Script>) -> Self {
        let calls = Calls::default();
        *calls.scripts.lock().unwrap() = scripts.into();
        Self(Arc::new(calls))
    }

    fn started(&self) -> usize {
        self.0.started.load(Ordering::SeqCst)
    }

    fn max_active(&self) -> usize {
        self.0.max_active.load(Ordering::SeqCst)
    }
}

impl InferenceTransport for ScriptedTransport {
    async fn predict(&self, _request: &PredictionRequest) -> DispatchOutcome {
        self.0.started.fetch_add(1, Ordering::SeqCst);
        let active = self.0.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.0.max_active.fetch_max(active, Ordering::SeqCst);

        let script = self.0.scripts.lock().unwrap().pop_front();
        let outcome = match script {
            Some(Script::Respond(outcome)) => {
                tokio::task::yield_now().await;
                outcome
            }
            Some(Script::Stall) | None => std::future::pending::<DispatchOutcome>().await,
        };

        self.0.active.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

struct Harness {
    controller: SessionController<ScriptedTransport>,
    transport: ScriptedTransport,
    previews: PreviewRegistry,
    seen: Arc<Mutex<Vec<SessionSnapshot>>>,
}

impl Harness {
    fn new(scripts: Vec<Script>) -> Self {
        let transport = ScriptedTransport::new(scripts);
        let previews = PreviewRegistry::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer: Observer = Arc::new(move |snapshot: &SessionSnapshot| {
            sink.lock().unwrap().push(snapshot.clone());
        });

        let controller = SessionController::new(
            SessionSettings::default(),
            previews.clone(),
            transport.clone(),
            observer,
        );

        Self {
            controller,
            transport,
            previews,
            seen,
        }
    }

    fn phases(&self) -> Vec<PhaseKind> {
        self.seen.lock().unwrap().iter().map(|s| s.phase).collect()
    }
}

fn video(name: &str, byte_size: u64) -> MediaFile {
    MediaFile::new(
        name,
        byte_size,
        "video/mp4",
        MediaSource::Memory(Arc::from(Vec::new())),
    )
}

fn json_response(status: u16, body: &str) -> Script {
    Script::Respond(DispatchOutcome::Response {
        status,
        body: body.as_bytes().to_vec(),
    })
}

const BASKETBALL: &str = r#"{"action": "basketball", "confidence": 92.3, "processing_time": 1.8}"#;

#[tokio::test]
async fn test_oversized_file_fails_without_network() {
    let harness = Harness::new(vec![]);

    let handle = harness
        .controller
        .select_file(video("big.mp4", 60 * MIB))
        .unwrap();

    assert!(handle.dispatch.is_none());
    assert_eq!(handle.snapshot.phase, PhaseKind::Failure);
    assert!(matches!(
        handle.snapshot.error,
        Some(SessionError::ClientValidation(ValidationReason::TooLarge { .. }))
    ));
    assert_eq!(harness.transport.started(), 0);
    assert_eq!(harness.previews.live_count(), 0);
    assert!(!harness.phases().contains(&PhaseKind::Loading));
}

#[tokio::test]
async fn test_unsupported_format_fails_without_network() {
    let harness = Harness::new(vec![]);

    let handle = harness
        .controller
        .select_file(video("clip.mkv", 10 * MIB))
        .unwrap();

    assert!(handle.dispatch.is_none());
    assert!(matches!(
        handle.snapshot.error,
        Some(SessionError::ClientValidation(
            ValidationReason::UnsupportedFormat { .. }
        ))
    ));
    assert_eq!(harness.transport.started(), 0);
}

#[tokio::test]
async fn test_successful_prediction() {
    let harness = Harness::new(vec![json_response(200, BASKETBALL)]);

    let handle = harness
        .controller
        .select_file(video("clip.mp4", 5 * MIB))
        .unwrap();
    assert_eq!(handle.snapshot.phase, PhaseKind::Loading);
    assert!(!handle.snapshot.accepts_files);

    handle.dispatch.expect("accepted file is dispatched").await.unwrap();

    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.phase, PhaseKind::Success);
    assert_eq!(
        snapshot.result,
        Some(PredictionResponse {
            action: "basketball".to_string(),
            confidence: 92.3,
            processing_time: 1.8,
        })
    );
    assert_eq!(snapshot.action_label.as_deref(), Some("Basketball"));
    assert!(snapshot.preview_url.is_some());
    assert!(snapshot.accepts_files);

    assert_eq!(harness.transport.started(), 1);
    assert_eq!(harness.phases(), vec![PhaseKind::Loading, PhaseKind::Success]);
}

#[tokio::test(start_paused = true)]
async fn test_pure_timeout_uses_generic_network_message() {
    let harness = Harness::new(vec![Script::Stall]);

    let handle = harness
        .controller
        .select_file(video("clip.mp4", 5 * MIB))
        .unwrap();
    handle.dispatch.unwrap().await.unwrap();

    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.error, Some(SessionError::Timeout));
    assert_eq!(snapshot.error_message.as_deref(), Some(NETWORK_GENERIC_MESSAGE));
    assert_ne!(
        snapshot.error_message.as_deref(),
        actionlens_core::classify::default_status_message(503)
    );
}

#[tokio::test]
async fn test_503_reports_model_loading() {
    let harness = Harness::new(vec![json_response(503, "")]);

    let handle = harness
        .controller
        .select_file(video("clip.mp4", 5 * MIB))
        .unwrap();
    handle.dispatch.unwrap().await.unwrap();

    let snapshot = harness.controller.snapshot();
    assert_eq!(
        snapshot.error_message.as_deref(),
        Some("Model is still loading. Please wait a moment and try again.")
    );
}

#[tokio::test]
async fn test_415_without_body() {
    let harness = Harness::new(vec![json_response(415, "")]);

    let handle = harness
        .controller
        .select_file(video("clip.avi", 5 * MIB))
        .unwrap();
    handle.dispatch.unwrap().await.unwrap();

    assert_eq!(
        harness.controller.snapshot().error,
        Some(SessionError::ServerError {
            status: 415,
            message: "Unsupported file format. Please use MP4, AVI, or MOV.".to_string(),
        })
    );
}

#[tokio::test]
async fn test_unreachable_service() {
    let harness = Harness::new(vec![Script::Respond(DispatchOutcome::NoResponse)]);

    let handle = harness
        .controller
        .select_file(video("clip.mov", 5 * MIB))
        .unwrap();
    handle.dispatch.unwrap().await.unwrap();

    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.error, Some(SessionError::NetworkUnreachable));
    assert_eq!(
        snapshot.error_message.as_deref(),
        Some("Cannot connect to server. Is the backend running?")
    );
    // The preview stays until the user resets or picks another file.
    assert_eq!(harness.previews.live_count(), 1);
}

#[tokio::test]
async fn test_selection_refused_while_loading() {
    let harness = Harness::new(vec![json_response(200, BASKETBALL)]);

    let handle = harness
        .controller
        .select_file(video("clip.mp4", 5 * MIB))
        .unwrap();

    let second = harness.controller.select_file(video("other.mp4", MIB));
    assert!(matches!(second, Err(CoreError::Busy)));

    handle.dispatch.unwrap().await.unwrap();
    assert_eq!(harness.transport.started(), 1);
    assert_eq!(harness.transport.max_active(), 1);
}

#[tokio::test]
async fn test_sequential_analyses_never_overlap() {
    let harness = Harness::new(vec![
        json_response(200, BASKETBALL),
        json_response(500, ""),
        json_response(200, BASKETBALL),
    ]);

    for name in ["a.mp4", "b.mp4", "c.mp4"] {
        let handle = harness.controller.select_file(video(name, MIB)).unwrap();
        handle.dispatch.unwrap().await.unwrap();
    }

    assert_eq!(harness.transport.started(), 3);
    assert_eq!(harness.transport.max_active(), 1);
    assert_eq!(harness.previews.live_count(), 1);
}

#[tokio::test]
async fn test_reset_after_success_leaves_no_preview() {
    let harness = Harness::new(vec![json_response(200, BASKETBALL)]);

    let handle = harness
        .controller
        .select_file(video("clip.mp4", 5 * MIB))
        .unwrap();
    handle.dispatch.unwrap().await.unwrap();
    assert_eq!(harness.previews.live_count(), 1);

    let snapshot = harness.controller.reset();
    assert_eq!(snapshot.phase, PhaseKind::Idle);
    assert!(snapshot.preview_url.is_none());
    assert!(snapshot.result.is_none());
    assert!(snapshot.error.is_none());
    assert_eq!(harness.previews.live_count(), 0);
    assert!(!harness.controller.inspect(|session| session.has_preview()));
}

#[tokio::test]
async fn test_reset_while_loading_cancels_dispatch() {
    let harness = Harness::new(vec![Script::Stall]);

    let handle = harness
        .controller
        .select_file(video("clip.mp4", 5 * MIB))
        .unwrap();
    let dispatch = handle.dispatch.unwrap();

    let snapshot = harness.controller.reset();
    assert_eq!(snapshot.phase, PhaseKind::Idle);
    assert!(!harness.controller.is_loading());

    let joined = dispatch.await;
    assert!(joined.unwrap_err().is_cancelled());
    assert_eq!(harness.controller.snapshot().phase, PhaseKind::Idle);
    assert_eq!(harness.previews.live_count(), 0);
    assert_eq!(harness.phases().last(), Some(&PhaseKind::Idle));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reset_always_aborts_dispatch() {
    for _ in 0..200 {
        let harness = Harness::new(vec![Script::Stall]);

        let controller = harness.controller.clone();
        let resetter = tokio::spawn(async move {
            while !controller.is_loading() {
                tokio::task::yield_now().await;
            }
            controller.reset()
        });

        let handle = harness
            .controller
            .select_file(video("clip.mp4", MIB))
            .unwrap();
        let snapshot = resetter.await.unwrap();
        assert_eq!(snapshot.phase, PhaseKind::Idle);

        let joined = tokio::time::timeout(Duration::from_secs(5), handle.dispatch.unwrap())
            .await
            .expect("dispatch still running after reset");
        assert!(joined.unwrap_err().is_cancelled());
        assert!(!harness.controller.is_loading());
        assert_eq!(harness.previews.live_count(), 0);
        assert_eq!(harness.phases().last(), Some(&PhaseKind::Idle));
    }
}

#[tokio::test(start_paused = true)]
async fn test_notice_expires_after_auto_hide() {
    let harness = Harness::new(vec![]);

    let handle = harness
        .controller
        .select_file(video("clip.mkv", MIB))
        .unwrap();
    let notice = handle.snapshot.notice.expect("failure raises a notice");
    assert_eq!(notice.auto_hide_ms, 8000);

    tokio::time::sleep(Duration::from_secs(9)).await;

    let snapshot = harness.controller.snapshot();
    assert!(snapshot.notice.is_none());
    assert_eq!(snapshot.phase, PhaseKind::Failure);
    assert!(snapshot.accepts_files);
}

#[tokio::test(start_paused = true)]
async fn test_expired_timer_does_not_hide_newer_notice() {
    let harness = Harness::new(vec![]);

    harness
        .controller
        .select_file(video("first.mkv", MIB))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let second = harness
        .controller
        .select_file(video("second.mkv", MIB))
        .unwrap();
    let second_id = second.snapshot.notice.unwrap().id;

    // The first notice's timer fires here; the second must survive it.
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(
        harness.controller.snapshot().notice.map(|n| n.id),
        Some(second_id)
    );
}

#[tokio::test]
async fn test_dismiss_notice() {
    let harness = Harness::new(vec![]);

    let handle = harness
        .controller
        .select_file(video("clip.mkv", MIB))
        .unwrap();
    let id = handle.snapshot.notice.unwrap().id;

    let snapshot = harness.controller.dismiss_notice(Some(id));
    assert!(snapshot.notice.is_none());
    assert_eq!(
        snapshot.error_message.as_deref(),
        Some("Unsupported format (.mkv). Please use MP4, AVI, or MOV.")
    );
}

#[tokio::test]
async fn test_reconfigure_applies_new_limits() {
    let harness = Harness::new(vec![]);

    let config = AnalysisConfig {
        max_upload_bytes: MIB,
        ..AnalysisConfig::default()
    };
    harness
        .controller
        .reconfigure(SessionSettings::from(&config), ScriptedTransport::new(vec![]))
        .unwrap();

    let handle = harness
        .controller
        .select_file(video("clip.mp4", 2 * MIB))
        .unwrap();
    assert_eq!(
        handle.snapshot.error_message.as_deref(),
        Some("File too large. Maximum size is 1MB.")
    );
}

fn one_mib_limit() -> SessionSettings {
    SessionSettings::from(&AnalysisConfig {
        max_upload_bytes: MIB,
        ..AnalysisConfig::default()
    })
}

#[tokio::test]
async fn test_reconfigure_swaps_transport_for_next_dispatch() {
    let harness = Harness::new(vec![]);
    let replacement = ScriptedTransport::new(vec![json_response(200, BASKETBALL)]);

    harness
        .controller
        .reconfigure(SessionSettings::default(), replacement.clone())
        .unwrap();

    let handle = harness
        .controller
        .select_file(video("clip.mp4", MIB))
        .unwrap();
    handle.dispatch.unwrap().await.unwrap();

    assert_eq!(harness.controller.snapshot().phase, PhaseKind::Success);
    assert_eq!(replacement.started(), 1);
    assert_eq!(harness.transport.started(), 0);
}

#[tokio::test]
async fn test_reconfigure_refused_while_loading() {
    let harness = Harness::new(vec![json_response(200, BASKETBALL)]);

    let handle = harness
        .controller
        .select_file(video("clip.mp4", 2 * MIB))
        .unwrap();
    let refused = harness
        .controller
        .reconfigure(one_mib_limit(), ScriptedTransport::new(vec![]));
    assert!(matches!(refused, Err(CoreError::Busy)));

    handle.dispatch.unwrap().await.unwrap();
    assert!(!harness.controller.has_pending_settings());
}

#[tokio::test]
async fn test_settings_saved_while_loading_apply_after_completion() {
    let harness = Harness::new(vec![json_response(200, BASKETBALL)]);

    let handle = harness
        .controller
        .select_file(video("clip.mp4", 2 * MIB))
        .unwrap();
    let outcome = harness
        .controller
        .reconfigure_when_idle(one_mib_limit(), harness.transport.clone());
    assert_eq!(outcome, Reconfigured::Deferred);
    assert!(harness.controller.has_pending_settings());

    handle.dispatch.unwrap().await.unwrap();
    assert_eq!(harness.controller.snapshot().phase, PhaseKind::Success);
    assert!(!harness.controller.has_pending_settings());

    let next = harness
        .controller
        .select_file(video("clip.mp4", 2 * MIB))
        .unwrap();
    assert!(next.dispatch.is_none());
    assert_eq!(
        next.snapshot.error_message.as_deref(),
        Some("File too large. Maximum size is 1MB.")
    );
}

#[tokio::test]
async fn test_settings_saved_while_loading_apply_on_reset() {
    let harness = Harness::new(vec![Script::Stall]);

    harness
        .controller
        .select_file(video("clip.mp4", 2 * MIB))
        .unwrap();
    let outcome = harness
        .controller
        .reconfigure_when_idle(one_mib_limit(), harness.transport.clone());
    assert_eq!(outcome, Reconfigured::Deferred);

    harness.controller.reset();
    assert!(!harness.controller.has_pending_settings());

    let next = harness
        .controller
        .select_file(video("clip.mp4", 2 * MIB))
        .unwrap();
    assert_eq!(next.snapshot.phase, PhaseKind::Failure);
}

#[tokio::test]
async fn test_reconfigure_when_idle_applies_immediately() {
    let harness = Harness::new(vec![]);

    let outcome = harness
        .controller
        .reconfigure_when_idle(one_mib_limit(), harness.transport.clone());
    assert_eq!(outcome, Reconfigured::Applied);
    assert!(!harness.controller.has_pending_settings());
}
