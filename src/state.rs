//! Unified application state for FretCoach
//!
//! This module provides the session state machine and the thread-safe shared
//! state accessed by:
//! - **Orchestrator**: applies transitions in response to commands and
//!   worker events
//! - **UI**: reads state for rendering, sends commands
//! - **Tests**: read state for assertions, send commands
//!
//! The design separates:
//! - **State**: shared data that can be queried synchronously
//! - **Commands**: requests to change state (sent to the orchestrator)
//! - **Events**: notifications for UI updates (device requests, errors)
//!
//! Device and worker completions enter the session as `SessionEvent`s; each
//! event maps to exactly one legal transition, and an event arriving in the
//! wrong state is a typed error, never a silent ignore.

use crate::audio::{AudioBlob, ChunkBuffer};
use crate::error::{Billable, CoachError, Result, TransitionError};
use crate::lessons::{starter_exercises, Exercise};
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;

/// Free-tier ceiling on analyzed recordings
pub const MAX_FREE_RECORDINGS: u32 = 5;
/// Free-tier ceiling on generated lessons
pub const MAX_FREE_LESSONS: u32 = 1;

/// Recording session lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No device held, no blob
    #[default]
    Idle,
    /// Device-open in flight
    Requesting,
    /// Device open, visualizer attached, chunks accumulating
    Recording,
    /// Blob finalized, device released; awaiting review/submit
    Stopped,
    /// Blob encoded and handed to the analysis gateway
    Submitting,
    /// Analysis succeeded; terminal until explicit discard
    Scored,
    /// Analysis failed; terminal until explicit discard
    Failed,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, SessionState::Recording)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, SessionState::Submitting)
    }

    /// Terminal states require an explicit discard to exit
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Scored | SessionState::Failed)
    }

    /// Whether the finalized blob must exist in this state
    pub fn has_blob(&self) -> bool {
        matches!(
            self,
            SessionState::Stopped
                | SessionState::Submitting
                | SessionState::Scored
                | SessionState::Failed
        )
    }

    fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Requesting => "Requesting",
            SessionState::Recording => "Recording",
            SessionState::Stopped => "Stopped",
            SessionState::Submitting => "Submitting",
            SessionState::Scored => "Scored",
            SessionState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Device and worker completions consumed by the session state machine
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// The microphone opened; capture is live
    DeviceOpened { sample_rate: u32 },
    /// The microphone could not be opened
    DeviceFailed(String),
    /// One audio fragment arrived
    DataAvailable(Vec<f32>),
    /// Capture stopped; the blob must be finalized
    CaptureStopped,
    /// The blob was handed to the analysis worker
    SubmitIssued,
    /// The gateway returned a result
    Scored,
    /// The gateway call failed
    AnalysisFailed(String),
    /// Explicit user discard ("new recording")
    Discarded,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::DeviceOpened { .. } => "DeviceOpened",
            SessionEvent::DeviceFailed(_) => "DeviceFailed",
            SessionEvent::DataAvailable(_) => "DataAvailable",
            SessionEvent::CaptureStopped => "CaptureStopped",
            SessionEvent::SubmitIssued => "SubmitIssued",
            SessionEvent::Scored => "Scored",
            SessionEvent::AnalysisFailed(_) => "AnalysisFailed",
            SessionEvent::Discarded => "Discarded",
        }
    }
}

/// One record → stop → (submit → result) cycle
///
/// Owns the ordered chunk sequence while recording and the finalized blob
/// afterwards. The blob is created exactly once, on stop, and survives until
/// discard so the user can review and retry-submit display states.
#[derive(Debug, Default)]
pub struct RecordingSession {
    state: SessionState,
    chunks: ChunkBuffer,
    final_blob: Option<AudioBlob>,
    sample_rate: Option<u32>,
    failure: Option<String>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Finalized blob, present iff the state carries one
    pub fn final_blob(&self) -> Option<&AudioBlob> {
        self.final_blob.as_ref()
    }

    /// Failure message for the `Failed` display state
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.chunk_count()
    }

    pub fn total_samples(&self) -> usize {
        self.chunks.total_samples()
    }

    /// Begin a session: `Idle → Requesting`
    ///
    /// The quota gate is the caller's pre-condition; by the time this runs
    /// the request is allowed.
    pub fn begin_request(&mut self) -> std::result::Result<(), TransitionError> {
        if self.state != SessionState::Idle {
            return Err(TransitionError {
                state: self.state.name(),
                event: "StartRecording",
            });
        }
        self.state = SessionState::Requesting;
        Ok(())
    }

    /// Apply a session event; exactly one transition is legal per event.
    pub fn apply(&mut self, event: SessionEvent) -> Result<()> {
        match (self.state, event) {
            (SessionState::Requesting, SessionEvent::DeviceOpened { sample_rate }) => {
                self.sample_rate = Some(sample_rate);
                self.state = SessionState::Recording;
                Ok(())
            }
            (SessionState::Requesting, SessionEvent::DeviceFailed(_)) => {
                self.state = SessionState::Idle;
                Ok(())
            }
            (SessionState::Recording, SessionEvent::DataAvailable(chunk)) => {
                self.chunks.append(chunk);
                Ok(())
            }
            (SessionState::Recording, SessionEvent::CaptureStopped) => {
                let sample_rate = self.sample_rate.unwrap_or(48_000);
                let blob = self.chunks.finalize(sample_rate)?;
                self.final_blob = Some(blob);
                self.state = SessionState::Stopped;
                Ok(())
            }
            (SessionState::Stopped, SessionEvent::SubmitIssued) => {
                self.state = SessionState::Submitting;
                Ok(())
            }
            (SessionState::Submitting, SessionEvent::Scored) => {
                self.state = SessionState::Scored;
                Ok(())
            }
            (SessionState::Submitting, SessionEvent::AnalysisFailed(message)) => {
                self.failure = Some(message);
                self.state = SessionState::Failed;
                Ok(())
            }
            (
                SessionState::Stopped | SessionState::Scored | SessionState::Failed,
                SessionEvent::Discarded,
            ) => {
                self.reset();
                Ok(())
            }
            (state, event) => Err(TransitionError {
                state: state.name(),
                event: event.name(),
            }
            .into()),
        }
    }

    /// Clone the finalized blob for the submit path
    pub fn blob_for_submit(&self) -> std::result::Result<AudioBlob, TransitionError> {
        // has_blob invariant guarantees presence in Stopped
        match (&self.state, &self.final_blob) {
            (SessionState::Stopped, Some(blob)) => Ok(blob.clone()),
            _ => Err(TransitionError {
                state: self.state.name(),
                event: "SubmitForAnalysis",
            }),
        }
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.chunks.clear();
        self.final_blob = None;
        self.sample_rate = None;
        self.failure = None;
    }

    /// Verify the blob-presence invariant; used by tests
    pub fn invariants_hold(&self) -> bool {
        self.final_blob.is_some() == self.state.has_blob()
    }
}

/// Structured feedback for one analyzed recording
///
/// Immutable value produced once per completed analysis call; replaced
/// wholesale on each new analysis. Field names follow the gateway's JSON
/// response schema.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Grade out of 10
    pub score: f32,
    /// Detailed analysis (rhythm, pitch, clarity)
    pub feedback: String,
    /// Technical advice to improve
    pub technical_advice: String,
    /// Music-theory point related to what was played
    pub theory_tip: String,
}

impl AnalysisResult {
    /// Display form of the score, e.g. `8/10`
    pub fn display_score(&self) -> String {
        format!("{}/10", self.score.round() as i64)
    }
}

/// Subscription and usage counters
///
/// Counters are monotonically non-decreasing while the account is
/// non-premium; once premium is set the checks are bypassed and the counters
/// stop moving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserAccount {
    pub is_premium: bool,
    pub recordings_used: u32,
    pub lessons_used: u32,
}

impl UserAccount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-flight quota gate for a new recording session
    pub fn can_start_recording(&self) -> bool {
        self.is_premium || self.recordings_used < MAX_FREE_RECORDINGS
    }

    /// Pre-flight quota gate for lesson generation
    pub fn can_generate_lesson(&self) -> bool {
        self.is_premium || self.lessons_used < MAX_FREE_LESSONS
    }

    /// Count one billable recording; only called on a scored outcome
    pub fn note_recording_scored(&mut self) {
        if !self.is_premium {
            self.recordings_used += 1;
        }
    }

    /// Count one billable lesson generation
    pub fn note_lesson_generated(&mut self) {
        if !self.is_premium {
            self.lessons_used += 1;
        }
    }
}

/// Unified application state
///
/// The single source of truth, shared across threads via `SharedAppState`.
/// All mutations go through the named transition methods below; there is no
/// ambient-global mutation anywhere else.
#[derive(Debug)]
pub struct AppState {
    /// The one active session (single-flight by construction)
    pub session: RecordingSession,
    /// Latest analysis; replaced wholesale per completed call
    pub analysis: Option<AnalysisResult>,
    /// Subscription tier and usage counters
    pub account: UserAccount,
    /// Exercise catalog (starter + generated)
    pub exercises: Vec<Exercise>,
    /// Current user-visible error, if any
    pub error: Option<String>,
    /// A lesson generation call is in flight
    pub generating_lesson: bool,
    /// A video generation call is in flight for this exercise id
    pub generating_video_for: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            session: RecordingSession::new(),
            analysis: None,
            account: UserAccount::new(),
            exercises: starter_exercises(),
            error: None,
            generating_lesson: false,
            generating_video_for: None,
        }
    }

    pub fn set_error(&mut self, error: String) {
        self.error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    // === Session transitions ===

    /// Quota-gated start: refuse before any device request is issued.
    pub fn try_start_session(&mut self) -> Result<()> {
        if !self.account.can_start_recording() {
            return Err(CoachError::QuotaExceeded(Billable::Recording));
        }
        self.session.begin_request()?;
        self.analysis = None;
        self.clear_error();
        Ok(())
    }

    pub fn device_opened(&mut self, sample_rate: u32) -> Result<()> {
        self.session.apply(SessionEvent::DeviceOpened { sample_rate })
    }

    pub fn device_failed(&mut self, reason: String) -> Result<()> {
        self.session
            .apply(SessionEvent::DeviceFailed(reason.clone()))?;
        self.set_error(CoachError::DeviceUnavailable(reason).user_message());
        Ok(())
    }

    pub fn append_chunk(&mut self, chunk: Vec<f32>) -> Result<()> {
        self.session.apply(SessionEvent::DataAvailable(chunk))
    }

    pub fn finish_capture(&mut self) -> Result<()> {
        self.session.apply(SessionEvent::CaptureStopped)
    }

    /// Move to `Submitting` and hand back the blob for the worker.
    pub fn begin_submit(&mut self) -> Result<AudioBlob> {
        let blob = self.session.blob_for_submit()?;
        self.session.apply(SessionEvent::SubmitIssued)?;
        Ok(blob)
    }

    /// A genuinely successful outcome: store the result and bill the quota
    /// exactly once.
    pub fn session_scored(&mut self, result: AnalysisResult) -> Result<()> {
        self.session.apply(SessionEvent::Scored)?;
        self.analysis = Some(result);
        self.account.note_recording_scored();
        Ok(())
    }

    /// A failed analysis: surface the message, leave the quota untouched.
    pub fn session_failed(&mut self, message: String) -> Result<()> {
        self.session
            .apply(SessionEvent::AnalysisFailed(message.clone()))?;
        self.set_error(message);
        Ok(())
    }

    /// Explicit "new recording" action out of `Stopped`/`Scored`/`Failed`.
    pub fn discard_session(&mut self) -> Result<()> {
        self.session.apply(SessionEvent::Discarded)?;
        self.analysis = None;
        self.clear_error();
        Ok(())
    }

    // === Account and catalog transitions ===

    /// Set the premium flag and unlock every exercise in one update.
    /// Idempotent.
    pub fn upgrade_to_premium(&mut self) {
        self.account.is_premium = true;
        for exercise in &mut self.exercises {
            exercise.is_locked = false;
        }
    }

    /// Prepend a freshly generated exercise and bill the lesson quota.
    pub fn add_generated_exercise(&mut self, exercise: Exercise) {
        self.exercises.insert(0, exercise);
        self.account.note_lesson_generated();
        self.generating_lesson = false;
    }

    /// Attach a generated video reference to an exercise.
    pub fn set_video_uri(&mut self, exercise_id: &str, uri: String) {
        if let Some(exercise) = self.exercises.iter_mut().find(|e| e.id == exercise_id) {
            exercise.video_uri = Some(uri);
        }
        self.generating_video_for = None;
    }

    /// Create an immutable snapshot of current state
    pub fn snapshot(&self) -> AppStateSnapshot {
        AppStateSnapshot {
            session_state: self.session.state(),
            chunk_count: self.session.chunk_count(),
            total_samples: self.session.total_samples(),
            blob_duration_secs: self.session.final_blob().map(AudioBlob::duration_secs),
            blob_size: self.session.final_blob().map(AudioBlob::len),
            session_failure: self.session.failure().map(str::to_string),
            analysis: self.analysis.clone(),
            account: self.account,
            exercises: self.exercises.clone(),
            error: self.error.clone(),
            generating_lesson: self.generating_lesson,
            generating_video_for: self.generating_video_for.clone(),
        }
    }
}

/// Immutable snapshot for rendering and assertions without holding locks
#[derive(Clone, Debug)]
pub struct AppStateSnapshot {
    pub session_state: SessionState,
    pub chunk_count: usize,
    pub total_samples: usize,
    pub blob_duration_secs: Option<f32>,
    pub blob_size: Option<usize>,
    pub session_failure: Option<String>,
    pub analysis: Option<AnalysisResult>,
    pub account: UserAccount,
    pub exercises: Vec<Exercise>,
    pub error: Option<String>,
    pub generating_lesson: bool,
    pub generating_video_for: Option<String>,
}

/// Thread-safe shared application state
#[derive(Clone)]
pub struct SharedAppState {
    inner: Arc<RwLock<AppState>>,
}

impl Default for SharedAppState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedAppState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppState::new())),
        }
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, AppState> {
        self.inner.read()
    }

    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, AppState> {
        self.inner.write()
    }

    /// Snapshot of current state (no lock held after return)
    pub fn snapshot(&self) -> AppStateSnapshot {
        self.inner.read().snapshot()
    }

    // === Convenience read methods ===

    pub fn session_state(&self) -> SessionState {
        self.inner.read().session.state()
    }

    pub fn is_recording(&self) -> bool {
        self.session_state().is_recording()
    }

    pub fn is_premium(&self) -> bool {
        self.inner.read().account.is_premium
    }

    pub fn recordings_used(&self) -> u32 {
        self.inner.read().account.recordings_used
    }

    pub fn lessons_used(&self) -> u32 {
        self.inner.read().account.lessons_used
    }

    pub fn analysis(&self) -> Option<AnalysisResult> {
        self.inner.read().analysis.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.read().error.clone()
    }
}

/// Commands that can be sent to control the application
///
/// Processed by the orchestrator; every state mutation originates here or in
/// a worker completion.
#[derive(Clone, Debug)]
pub enum AppCommand {
    /// Start a new recording session (quota-gated)
    StartRecording,
    /// The UI opened the microphone after `DeviceRequested`
    DeviceOpened { sample_rate: u32 },
    /// The UI failed to open the microphone
    DeviceFailed(String),
    /// Stop capture and finalize the blob
    StopRecording,
    /// Submit the finalized blob for analysis
    SubmitForAnalysis,
    /// Discard the current take and return to idle
    DiscardRecording,
    /// Generate a new lesson (quota-gated)
    GenerateLesson { level: String, topic: String },
    /// Generate a demonstration video for an exercise
    GenerateVideo { exercise_id: String },
    /// Simulated payment completed
    UpgradeToPremium,
    /// Shut down all workers
    Shutdown,
}

/// Events emitted by the orchestrator
///
/// Used for UI notifications; state itself should be queried from
/// `SharedAppState` rather than reconstructed from events.
#[derive(Clone, Debug)]
pub enum AppEvent {
    /// State changed; repaint
    StateChanged,
    /// The session passed the quota gate; the UI should open the microphone
    DeviceRequested,
    /// Pre-flight refusal; route the user to the upgrade surface
    QuotaExceeded(Billable),
    /// An analysis result landed
    AnalysisComplete,
    /// A generated lesson landed
    LessonReady,
    /// A generated video landed for this exercise id
    VideoReady(String),
    /// Video generation needs a different credential
    CredentialRequired,
    /// Error occurred
    Error(String),
    /// Shutdown complete
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_session() -> RecordingSession {
        let mut session = RecordingSession::new();
        session.begin_request().unwrap();
        session
            .apply(SessionEvent::DeviceOpened { sample_rate: 16_000 })
            .unwrap();
        session
    }

    #[test]
    fn happy_path_walks_every_state() {
        let mut session = RecordingSession::new();
        assert!(session.state().is_idle());

        session.begin_request().unwrap();
        assert_eq!(session.state(), SessionState::Requesting);

        session
            .apply(SessionEvent::DeviceOpened { sample_rate: 16_000 })
            .unwrap();
        assert_eq!(session.state(), SessionState::Recording);

        session
            .apply(SessionEvent::DataAvailable(vec![0.1, 0.2]))
            .unwrap();
        session.apply(SessionEvent::CaptureStopped).unwrap();
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(session.invariants_hold());

        session.apply(SessionEvent::SubmitIssued).unwrap();
        session.apply(SessionEvent::Scored).unwrap();
        assert_eq!(session.state(), SessionState::Scored);
        assert!(session.state().is_terminal());

        session.apply(SessionEvent::Discarded).unwrap();
        assert!(session.state().is_idle());
        assert!(session.invariants_hold());
        assert_eq!(session.chunk_count(), 0);
    }

    #[test]
    fn device_failure_returns_to_idle_without_a_blob() {
        let mut session = RecordingSession::new();
        session.begin_request().unwrap();
        session
            .apply(SessionEvent::DeviceFailed("denied".into()))
            .unwrap();
        assert!(session.state().is_idle());
        assert!(session.final_blob().is_none());
        assert!(session.invariants_hold());
    }

    #[test]
    fn blob_appears_exactly_on_stop() {
        let mut session = recording_session();
        assert!(session.final_blob().is_none());

        session.apply(SessionEvent::CaptureStopped).unwrap();
        assert!(session.final_blob().is_some());
        assert!(session.invariants_hold());
    }

    #[test]
    fn stop_with_zero_chunks_still_finalizes() {
        let mut session = recording_session();
        session.apply(SessionEvent::CaptureStopped).unwrap();

        assert_eq!(session.state(), SessionState::Stopped);
        let blob = session.final_blob().unwrap();
        assert_eq!(blob.duration_secs(), 0.0);
    }

    #[test]
    fn illegal_events_are_typed_errors() {
        let mut session = RecordingSession::new();

        // Submit from Idle
        assert!(session.apply(SessionEvent::SubmitIssued).is_err());
        // Chunk outside Recording
        assert!(session
            .apply(SessionEvent::DataAvailable(vec![0.0]))
            .is_err());
        // Score without a submission
        assert!(session.apply(SessionEvent::Scored).is_err());
        // Discard from Idle
        assert!(session.apply(SessionEvent::Discarded).is_err());
        // State untouched by refused events
        assert!(session.state().is_idle());
    }

    #[test]
    fn double_start_is_refused() {
        let mut session = RecordingSession::new();
        session.begin_request().unwrap();
        let err = session.begin_request().unwrap_err();
        assert_eq!(err.state, "Requesting");
    }

    #[test]
    fn failed_analysis_keeps_the_blob_for_review() {
        let mut session = recording_session();
        session.apply(SessionEvent::CaptureStopped).unwrap();
        session.apply(SessionEvent::SubmitIssued).unwrap();
        session
            .apply(SessionEvent::AnalysisFailed("network".into()))
            .unwrap();

        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.failure(), Some("network"));
        assert!(session.final_blob().is_some());
        assert!(session.invariants_hold());
    }

    #[test]
    fn quota_gate_boundary_values() {
        for used in 0..MAX_FREE_RECORDINGS {
            let account = UserAccount {
                recordings_used: used,
                ..UserAccount::new()
            };
            assert!(account.can_start_recording(), "allowed at {used}");
        }
        let at_limit = UserAccount {
            recordings_used: MAX_FREE_RECORDINGS,
            ..UserAccount::new()
        };
        assert!(!at_limit.can_start_recording());

        let premium = UserAccount {
            is_premium: true,
            recordings_used: MAX_FREE_RECORDINGS + 10,
            ..UserAccount::new()
        };
        assert!(premium.can_start_recording());
    }

    #[test]
    fn quota_refusal_issues_no_device_request() {
        let mut state = AppState::new();
        state.account.recordings_used = MAX_FREE_RECORDINGS;

        let err = state.try_start_session().unwrap_err();
        assert!(matches!(err, CoachError::QuotaExceeded(Billable::Recording)));
        // Session never left Idle, so no device request can have been issued
        assert!(state.session.state().is_idle());
    }

    #[test]
    fn counter_moves_only_on_scored() {
        let result = AnalysisResult {
            score: 8.0,
            feedback: "f".into(),
            technical_advice: "t".into(),
            theory_tip: "y".into(),
        };

        let mut state = AppState::new();
        for attempt in 0..3u32 {
            state.try_start_session().unwrap();
            state.device_opened(16_000).unwrap();
            state.finish_capture().unwrap();
            state.begin_submit().unwrap();
            state.session_failed("boom".into()).unwrap();
            assert_eq!(state.account.recordings_used, 0, "attempt {attempt}");
            state.discard_session().unwrap();
        }

        state.try_start_session().unwrap();
        state.device_opened(16_000).unwrap();
        state.finish_capture().unwrap();
        state.begin_submit().unwrap();
        state.session_scored(result).unwrap();
        assert_eq!(state.account.recordings_used, 1);
        assert_eq!(state.analysis.as_ref().unwrap().display_score(), "8/10");
    }

    #[test]
    fn premium_upgrade_is_idempotent_and_unlocks_everything() {
        let mut state = AppState::new();
        assert!(state.exercises.iter().any(|e| e.is_locked));

        state.upgrade_to_premium();
        assert!(state.account.is_premium);
        assert!(state.exercises.iter().all(|e| !e.is_locked));

        let before = state.account;
        state.upgrade_to_premium();
        assert_eq!(state.account, before);
        assert!(state.exercises.iter().all(|e| !e.is_locked));
    }

    #[test]
    fn premium_freezes_the_counters() {
        let mut account = UserAccount {
            is_premium: true,
            ..UserAccount::new()
        };
        account.note_recording_scored();
        account.note_lesson_generated();
        assert_eq!(account.recordings_used, 0);
        assert_eq!(account.lessons_used, 0);
    }

    #[test]
    fn shared_state_snapshot_is_independent() {
        let shared = SharedAppState::new();
        let snapshot1 = shared.snapshot();
        assert!(snapshot1.session_state.is_idle());

        {
            shared.write().try_start_session().unwrap();
        }

        assert!(snapshot1.session_state.is_idle());
        assert_eq!(shared.session_state(), SessionState::Requesting);
    }

    #[test]
    fn display_score_rounds_to_whole_numbers() {
        let result = AnalysisResult {
            score: 7.6,
            feedback: String::new(),
            technical_advice: String::new(),
            theory_tip: String::new(),
        };
        assert_eq!(result.display_score(), "8/10");
    }
}
