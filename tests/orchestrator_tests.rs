//! End-to-end orchestrator scenarios
//!
//! Drives the full pipeline — commands in, worker events routed, shared
//! state mutated — against canned gateway backends.

use async_trait::async_trait;
use fretcoach::error::GatewayError;
use fretcoach::gateway::{AnalysisBackend, GenerationBackend};
use fretcoach::lessons::{Difficulty, LessonRecord};
use fretcoach::processor::{Orchestrator, OrchestratorConfig, OrchestratorHandle};
use fretcoach::state::{
    AnalysisResult, AppEvent, SessionState, SharedAppState, MAX_FREE_RECORDINGS,
};
use fretcoach::Billable;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Analysis backend with a scripted outcome
struct MockAnalysis {
    score: f32,
    fail: bool,
}

#[async_trait]
impl AnalysisBackend for MockAnalysis {
    async fn analyze(
        &self,
        audio_b64: &str,
        media_type: &str,
    ) -> Result<AnalysisResult, GatewayError> {
        if self.fail {
            return Err(GatewayError::Network("connection refused".into()));
        }
        // The orchestrator must hand over a real encoding of a WAV blob
        assert!(!audio_b64.is_empty());
        assert_eq!(media_type, "audio/wav");
        Ok(AnalysisResult {
            score: self.score,
            feedback: "f".into(),
            technical_advice: "t".into(),
            theory_tip: "y".into(),
        })
    }
}

/// Generation backend with scripted lesson/video outcomes
struct MockGeneration {
    video_entity_missing: bool,
}

#[async_trait]
impl GenerationBackend for MockGeneration {
    async fn generate_lesson(
        &self,
        level: &str,
        topic: &str,
    ) -> Result<LessonRecord, GatewayError> {
        Ok(LessonRecord {
            title: format!("{topic} ({level})"),
            difficulty: Difficulty::Intermediate,
            description: "generated".into(),
            theory: "theory".into(),
            lesson_steps: vec!["one".into(), "two".into(), "three".into()],
            tablature: "e|-|\nB|-|\nG|-|\nD|-|\nA|-|\nE|-|".into(),
        })
    }

    async fn generate_video(
        &self,
        _title: &str,
        _description: &str,
        _cancel: Arc<AtomicBool>,
    ) -> Result<String, GatewayError> {
        if self.video_entity_missing {
            Err(GatewayError::EntityNotFound)
        } else {
            Ok("https://media/demo.mp4".into())
        }
    }
}

fn launch(
    analysis: MockAnalysis,
    generation: MockGeneration,
) -> (SharedAppState, OrchestratorHandle) {
    let state = SharedAppState::new();
    let (orchestrator, handle) = Orchestrator::with_backends(
        OrchestratorConfig::default().with_shutdown_timeout_ms(2_000),
        state.clone(),
        Arc::new(analysis),
        Arc::new(generation),
    )
    .expect("orchestrator setup");
    orchestrator.start().expect("orchestrator start");
    (state, handle)
}

/// Poll a condition with a timeout
fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

/// Collect events until one matches, or time out
fn wait_for_event(
    handle: &OrchestratorHandle,
    timeout: Duration,
    mut matches: impl FnMut(&AppEvent) -> bool,
) -> Option<AppEvent> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(event) = handle.recv_event_timeout(Duration::from_millis(50)) {
            if matches(&event) {
                return Some(event);
            }
        }
    }
    None
}

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn full_session_reaches_scored_and_bills_once() {
    let (state, handle) = launch(
        MockAnalysis {
            score: 8.0,
            fail: false,
        },
        MockGeneration {
            video_entity_missing: false,
        },
    );

    handle.start_recording().unwrap();
    assert!(
        wait_for_event(&handle, WAIT, |e| matches!(e, AppEvent::DeviceRequested)).is_some(),
        "quota gate passed, device request must follow"
    );

    handle.device_opened(16_000).unwrap();
    assert!(wait_until(WAIT, || state.session_state().is_recording()));

    // Three fragments in emission order
    let chunk_tx = handle.chunk_sender();
    chunk_tx.send(vec![0.1]).unwrap();
    chunk_tx.send(vec![0.2, 0.3]).unwrap();
    chunk_tx.send(vec![0.4]).unwrap();
    assert!(wait_until(WAIT, || state.read().session.chunk_count() == 3));

    handle.stop_recording().unwrap();
    assert!(wait_until(WAIT, || state.session_state()
        == SessionState::Stopped));
    assert_eq!(state.read().session.total_samples(), 4);

    handle.submit_for_analysis().unwrap();
    assert!(wait_until(WAIT, || state.session_state()
        == SessionState::Scored));

    let snapshot = state.snapshot();
    assert_eq!(snapshot.analysis.unwrap().display_score(), "8/10");
    assert_eq!(snapshot.account.recordings_used, 1, "scored bills exactly once");

    handle.shutdown().unwrap();
    assert!(
        wait_for_event(&handle, WAIT, |e| matches!(e, AppEvent::Shutdown)).is_some(),
        "shutdown must complete"
    );
}

#[test]
fn quota_exhausted_start_is_refused_without_a_device_request() {
    let (state, handle) = launch(
        MockAnalysis {
            score: 8.0,
            fail: false,
        },
        MockGeneration {
            video_entity_missing: false,
        },
    );

    state.write().account.recordings_used = MAX_FREE_RECORDINGS;

    handle.start_recording().unwrap();

    // Collect everything emitted until the refusal lands, so a stray device
    // request cannot slip past unobserved
    let mut events = Vec::new();
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if let Some(event) = handle.recv_event_timeout(Duration::from_millis(50)) {
            let done = matches!(event, AppEvent::QuotaExceeded(Billable::Recording));
            events.push(event);
            if done {
                break;
            }
        }
    }

    assert!(
        events
            .iter()
            .any(|e| matches!(e, AppEvent::QuotaExceeded(Billable::Recording))),
        "refusal must route to the upgrade surface"
    );
    assert!(
        !events.iter().any(|e| matches!(e, AppEvent::DeviceRequested)),
        "no device request on refusal"
    );
    assert!(state.session_state().is_idle());

    handle.shutdown().unwrap();
}

#[test]
fn gateway_failure_reaches_failed_and_leaves_quota_untouched() {
    let (state, handle) = launch(
        MockAnalysis {
            score: 0.0,
            fail: true,
        },
        MockGeneration {
            video_entity_missing: false,
        },
    );

    handle.start_recording().unwrap();
    assert!(wait_for_event(&handle, WAIT, |e| matches!(e, AppEvent::DeviceRequested)).is_some());
    handle.device_opened(16_000).unwrap();
    assert!(wait_until(WAIT, || state.session_state().is_recording()));

    handle.chunk_sender().send(vec![0.5; 128]).unwrap();
    assert!(wait_until(WAIT, || state.read().session.chunk_count() == 1));

    handle.stop_recording().unwrap();
    assert!(wait_until(WAIT, || state.session_state()
        == SessionState::Stopped));

    handle.submit_for_analysis().unwrap();
    assert!(wait_until(WAIT, || state.session_state()
        == SessionState::Failed));

    let snapshot = state.snapshot();
    assert_eq!(snapshot.account.recordings_used, 0, "failures never bill");
    let message = snapshot.error.expect("failure is surfaced");
    assert!(
        message.contains("connection refused"),
        "gateway error surfaced verbatim: {message}"
    );

    // Recovery is explicit: discard, then a new session is allowed
    handle.discard_recording().unwrap();
    assert!(wait_until(WAIT, || state.session_state().is_idle()));

    handle.shutdown().unwrap();
}

#[test]
fn lesson_generation_adds_to_catalog_and_hits_its_quota() {
    let (state, handle) = launch(
        MockAnalysis {
            score: 8.0,
            fail: false,
        },
        MockGeneration {
            video_entity_missing: false,
        },
    );

    let catalog_before = state.snapshot().exercises.len();

    handle
        .generate_lesson("Intermediate".into(), "Blues Licks".into())
        .unwrap();
    assert!(
        wait_for_event(&handle, WAIT, |e| matches!(e, AppEvent::LessonReady)).is_some()
    );

    let snapshot = state.snapshot();
    assert_eq!(snapshot.exercises.len(), catalog_before + 1);
    assert_eq!(snapshot.exercises[0].title, "Blues Licks (Intermediate)");
    assert!(!snapshot.exercises[0].is_locked);
    assert_eq!(snapshot.account.lessons_used, 1);

    // Free tier allows exactly one generated lesson
    handle
        .generate_lesson("Intermediate".into(), "Arpeggios".into())
        .unwrap();
    assert!(wait_for_event(&handle, WAIT, |e| {
        matches!(e, AppEvent::QuotaExceeded(Billable::Lesson))
    })
    .is_some());
    assert_eq!(state.snapshot().exercises.len(), catalog_before + 1);

    handle.shutdown().unwrap();
}

#[test]
fn video_success_attaches_the_reference() {
    let (state, handle) = launch(
        MockAnalysis {
            score: 8.0,
            fail: false,
        },
        MockGeneration {
            video_entity_missing: false,
        },
    );

    let exercise_id = state.snapshot().exercises[0].id.clone();
    handle.generate_video(exercise_id.clone()).unwrap();

    assert!(
        wait_for_event(&handle, WAIT, |e| matches!(e, AppEvent::VideoReady(_))).is_some()
    );
    let snapshot = state.snapshot();
    let exercise = snapshot
        .exercises
        .iter()
        .find(|e| e.id == exercise_id)
        .unwrap();
    assert_eq!(exercise.video_uri.as_deref(), Some("https://media/demo.mp4"));
    assert!(snapshot.generating_video_for.is_none());

    handle.shutdown().unwrap();
}

#[test]
fn video_entity_not_found_requests_a_new_credential() {
    let (state, handle) = launch(
        MockAnalysis {
            score: 8.0,
            fail: false,
        },
        MockGeneration {
            video_entity_missing: true,
        },
    );

    let exercise_id = state.snapshot().exercises[0].id.clone();
    handle.generate_video(exercise_id).unwrap();

    assert!(
        wait_for_event(&handle, WAIT, |e| matches!(e, AppEvent::CredentialRequired)).is_some(),
        "entity-not-found prompts re-authentication, not a generic retry"
    );
    let snapshot = state.snapshot();
    assert!(snapshot.generating_video_for.is_none());
    assert!(snapshot.exercises.iter().all(|e| e.video_uri.is_none()));

    handle.shutdown().unwrap();
}

#[test]
fn premium_upgrade_command_unlocks_the_catalog() {
    let (state, handle) = launch(
        MockAnalysis {
            score: 8.0,
            fail: false,
        },
        MockGeneration {
            video_entity_missing: false,
        },
    );

    assert!(state.snapshot().exercises.iter().any(|e| e.is_locked));
    handle.upgrade_to_premium().unwrap();

    assert!(wait_until(WAIT, || state.is_premium()));
    assert!(state.snapshot().exercises.iter().all(|e| !e.is_locked));

    handle.shutdown().unwrap();
}

#[test]
fn fragments_outside_recording_are_dropped_not_appended() {
    let (state, handle) = launch(
        MockAnalysis {
            score: 8.0,
            fail: false,
        },
        MockGeneration {
            video_entity_missing: false,
        },
    );

    // Session is Idle; a stray fragment must not land anywhere
    handle.chunk_sender().send(vec![0.9; 64]).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(state.read().session.chunk_count(), 0);
    assert!(state.session_state().is_idle());

    handle.shutdown().unwrap();
}
