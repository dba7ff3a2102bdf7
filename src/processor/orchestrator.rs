//! Session orchestrator
//!
//! The orchestrator is the single logical thread of control: every state
//! mutation happens here, in response to external commands (UI, tests),
//! capture fragments, or worker completions. Device I/O and network calls
//! run elsewhere and report back as events, so the loop never blocks.
//!
//! It owns exactly one `RecordingSession` and at most one `AnalysisResult`;
//! starting a new session before the previous one resolved is refused, which
//! is what makes the whole pipeline single-flight by construction.

use crate::config::GatewayConfig;
use crate::error::{Billable, CoachError, Result};
use crate::gateway::{AnalysisBackend, AnalysisGateway, GenerationBackend, GenerationGateway};
use crate::lessons::Exercise;
use crate::processor::{
    AnalysisCommand, AnalysisEvent, AnalysisHandle, AnalysisRunner, GenerationCommand,
    GenerationEvent, GenerationHandle, GenerationRunner,
};
use crate::state::{AppCommand, AppEvent, SharedAppState};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Configuration for the orchestrator
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Channel buffer size for commands and events
    pub channel_buffer_size: usize,
    /// Shutdown timeout in milliseconds
    pub shutdown_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 100,
            shutdown_timeout_ms: 5000,
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }

    pub fn with_shutdown_timeout_ms(mut self, timeout: u64) -> Self {
        self.shutdown_timeout_ms = timeout;
        self
    }
}

/// Handle for controlling the orchestrator from the UI or tests
pub struct OrchestratorHandle {
    command_tx: Sender<AppCommand>,
    event_rx: Receiver<AppEvent>,
    state: SharedAppState,
    chunk_tx: Sender<Vec<f32>>,
}

impl OrchestratorHandle {
    /// Send a command to the orchestrator
    pub fn send_command(&self, cmd: AppCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| CoachError::Channel(format!("failed to send command: {e}")))
    }

    pub fn start_recording(&self) -> Result<()> {
        self.send_command(AppCommand::StartRecording)
    }

    /// Report that the UI opened the microphone
    pub fn device_opened(&self, sample_rate: u32) -> Result<()> {
        self.send_command(AppCommand::DeviceOpened { sample_rate })
    }

    /// Report that the UI could not open the microphone
    pub fn device_failed(&self, reason: String) -> Result<()> {
        self.send_command(AppCommand::DeviceFailed(reason))
    }

    pub fn stop_recording(&self) -> Result<()> {
        self.send_command(AppCommand::StopRecording)
    }

    pub fn submit_for_analysis(&self) -> Result<()> {
        self.send_command(AppCommand::SubmitForAnalysis)
    }

    pub fn discard_recording(&self) -> Result<()> {
        self.send_command(AppCommand::DiscardRecording)
    }

    pub fn generate_lesson(&self, level: String, topic: String) -> Result<()> {
        self.send_command(AppCommand::GenerateLesson { level, topic })
    }

    pub fn generate_video(&self, exercise_id: String) -> Result<()> {
        self.send_command(AppCommand::GenerateVideo { exercise_id })
    }

    pub fn upgrade_to_premium(&self) -> Result<()> {
        self.send_command(AppCommand::UpgradeToPremium)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send_command(AppCommand::Shutdown)
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<AppEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event, blocking until available
    pub fn recv_event(&self) -> Result<AppEvent> {
        self.event_rx
            .recv()
            .map_err(|e| CoachError::Channel(format!("failed to receive event: {e}")))
    }

    /// Receive an event with a timeout
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<AppEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// The shared application state, for direct queries
    pub fn state(&self) -> &SharedAppState {
        &self.state
    }

    /// Sender for capture fragments
    ///
    /// Fragments are mono f32 samples; the capture callback clones this.
    pub fn chunk_sender(&self) -> Sender<Vec<f32>> {
        self.chunk_tx.clone()
    }
}

/// Main orchestrator coordinating capture, analysis, and generation
pub struct Orchestrator {
    config: OrchestratorConfig,
    state: SharedAppState,
    command_rx: Receiver<AppCommand>,
    event_tx: Sender<AppEvent>,
    chunk_rx: Receiver<Vec<f32>>,
    analysis_runner: Option<AnalysisRunner>,
    generation_runner: Option<GenerationRunner>,
}

impl Orchestrator {
    /// Create an orchestrator backed by the real gateways
    pub fn new(
        gateway: GatewayConfig,
        config: OrchestratorConfig,
    ) -> Result<(Self, OrchestratorHandle)> {
        let analysis: Arc<dyn AnalysisBackend> = Arc::new(AnalysisGateway::new(gateway.clone())?);
        let generation: Arc<dyn GenerationBackend> = Arc::new(GenerationGateway::new(gateway)?);
        Self::with_backends(config, SharedAppState::new(), analysis, generation)
    }

    /// Create an orchestrator with explicit state and backends
    ///
    /// This is the seam the integration tests use: canned backends, shared
    /// state created up front for assertions.
    pub fn with_backends(
        config: OrchestratorConfig,
        state: SharedAppState,
        analysis: Arc<dyn AnalysisBackend>,
        generation: Arc<dyn GenerationBackend>,
    ) -> Result<(Self, OrchestratorHandle)> {
        let buffer_size = config.channel_buffer_size;

        let (command_tx, command_rx) = bounded(buffer_size);
        let (event_tx, event_rx) = bounded(buffer_size);
        // Larger buffer for audio fragments
        let (chunk_tx, chunk_rx) = bounded(buffer_size * 10);

        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
            state: state.clone(),
            chunk_tx,
        };

        let orchestrator = Self {
            config,
            state,
            command_rx,
            event_tx,
            chunk_rx,
            analysis_runner: Some(AnalysisRunner::new(analysis)),
            generation_runner: Some(GenerationRunner::new(generation)),
        };

        Ok((orchestrator, handle))
    }

    /// Start the workers and the orchestrator loop
    ///
    /// Consumes the orchestrator; returns the loop's join handle.
    pub fn start(mut self) -> Result<Vec<JoinHandle<()>>> {
        let analysis_handle = self
            .analysis_runner
            .take()
            .ok_or_else(|| CoachError::Channel("analysis runner already taken".into()))?
            .start_worker()?;
        info!("Analysis worker started");

        let generation_handle = self
            .generation_runner
            .take()
            .ok_or_else(|| CoachError::Channel("generation runner already taken".into()))?
            .start_worker()?;
        info!("Generation worker started");

        let loop_handle = self.run_loop(analysis_handle, generation_handle);
        info!("Orchestrator loop started");

        Ok(vec![loop_handle])
    }

    fn run_loop(
        self,
        analysis: AnalysisHandle,
        generation: GenerationHandle,
    ) -> JoinHandle<()> {
        let state = self.state;
        let command_rx = self.command_rx;
        let event_tx = self.event_tx;
        let chunk_rx = self.chunk_rx;
        let shutdown_timeout = Duration::from_millis(self.config.shutdown_timeout_ms);

        thread::spawn(move || {
            info!("Orchestrator main loop starting");
            // Monotonic id source for generated lessons
            let mut lesson_seq: u32 = 0;

            loop {
                select! {
                    recv(command_rx) -> cmd => {
                        match cmd {
                            Ok(AppCommand::StartRecording) => {
                                let outcome = state.write().try_start_session();
                                match outcome {
                                    Ok(()) => {
                                        let _ = event_tx.send(AppEvent::DeviceRequested);
                                        let _ = event_tx.send(AppEvent::StateChanged);
                                        debug!("Session requested, waiting for device");
                                    }
                                    Err(CoachError::QuotaExceeded(op)) => {
                                        warn!("Recording refused: quota exhausted");
                                        let _ = event_tx.send(AppEvent::QuotaExceeded(op));
                                    }
                                    Err(e) => {
                                        warn!("Cannot start recording: {}", e);
                                    }
                                }
                            }

                            Ok(AppCommand::DeviceOpened { sample_rate }) => {
                                match state.write().device_opened(sample_rate) {
                                    Ok(()) => {
                                        let _ = event_tx.send(AppEvent::StateChanged);
                                        debug!("Recording at {}Hz", sample_rate);
                                    }
                                    Err(e) => warn!("Unexpected device-opened: {}", e),
                                }
                            }

                            Ok(AppCommand::DeviceFailed(reason)) => {
                                let message =
                                    CoachError::DeviceUnavailable(reason.clone()).user_message();
                                match state.write().device_failed(reason) {
                                    Ok(()) => {
                                        let _ = event_tx.send(AppEvent::Error(message));
                                        let _ = event_tx.send(AppEvent::StateChanged);
                                    }
                                    Err(e) => warn!("Unexpected device-failed: {}", e),
                                }
                            }

                            Ok(AppCommand::StopRecording) => {
                                match state.write().finish_capture() {
                                    Ok(()) => {
                                        let _ = event_tx.send(AppEvent::StateChanged);
                                        debug!("Recording stopped, blob finalized");
                                    }
                                    Err(e) => warn!("Cannot stop recording: {}", e),
                                }
                            }

                            Ok(AppCommand::SubmitForAnalysis) => {
                                let blob = state.write().begin_submit();
                                match blob {
                                    Ok(blob) => {
                                        let _ = event_tx.send(AppEvent::StateChanged);
                                        if let Err(e) = analysis.analyze(blob) {
                                            error!("Failed to queue analysis: {}", e);
                                            let message = e.user_message();
                                            let _ = state.write().session_failed(message.clone());
                                            let _ = event_tx.send(AppEvent::Error(message));
                                            let _ = event_tx.send(AppEvent::StateChanged);
                                        }
                                    }
                                    Err(e) => warn!("Cannot submit: {}", e),
                                }
                            }

                            Ok(AppCommand::DiscardRecording) => {
                                match state.write().discard_session() {
                                    Ok(()) => {
                                        let _ = event_tx.send(AppEvent::StateChanged);
                                        debug!("Session discarded");
                                    }
                                    Err(e) => warn!("Cannot discard: {}", e),
                                }
                            }

                            Ok(AppCommand::GenerateLesson { level, topic }) => {
                                let (busy, allowed) = {
                                    let s = state.read();
                                    (s.generating_lesson, s.account.can_generate_lesson())
                                };
                                if busy {
                                    warn!("Lesson generation already in flight");
                                } else if !allowed {
                                    warn!("Lesson refused: quota exhausted");
                                    let _ =
                                        event_tx.send(AppEvent::QuotaExceeded(Billable::Lesson));
                                } else {
                                    state.write().generating_lesson = true;
                                    let _ = event_tx.send(AppEvent::StateChanged);
                                    if let Err(e) = generation.generate_lesson(level, topic) {
                                        error!("Failed to queue lesson: {}", e);
                                        state.write().generating_lesson = false;
                                    }
                                }
                            }

                            Ok(AppCommand::GenerateVideo { exercise_id }) => {
                                let target = {
                                    let s = state.read();
                                    if s.generating_video_for.is_some() {
                                        None
                                    } else {
                                        s.exercises
                                            .iter()
                                            .find(|e| e.id == exercise_id)
                                            .map(|e| (e.title.clone(), e.description.clone()))
                                    }
                                };
                                match target {
                                    Some((title, description)) => {
                                        state.write().generating_video_for =
                                            Some(exercise_id.clone());
                                        let _ = event_tx.send(AppEvent::StateChanged);
                                        if let Err(e) = generation.generate_video(
                                            exercise_id,
                                            title,
                                            description,
                                        ) {
                                            error!("Failed to queue video: {}", e);
                                            state.write().generating_video_for = None;
                                        }
                                    }
                                    None => {
                                        warn!(
                                            "Cannot generate video for {} (busy or unknown)",
                                            exercise_id
                                        );
                                    }
                                }
                            }

                            Ok(AppCommand::UpgradeToPremium) => {
                                state.write().upgrade_to_premium();
                                let _ = event_tx.send(AppEvent::StateChanged);
                                info!("Account upgraded to premium");
                            }

                            Ok(AppCommand::Shutdown) => {
                                info!("Shutdown requested");
                                generation.cancel_video();
                                let _ = analysis.command_tx.send(AnalysisCommand::Shutdown);
                                let _ = generation.command_tx.send(GenerationCommand::Shutdown);

                                let mut analysis_done = false;
                                let mut generation_done = false;
                                let deadline = std::time::Instant::now() + shutdown_timeout;

                                while !(analysis_done && generation_done) {
                                    if std::time::Instant::now() > deadline {
                                        warn!("Shutdown timeout reached, forcing exit");
                                        break;
                                    }
                                    if let Ok(event) = analysis
                                        .event_rx
                                        .recv_timeout(Duration::from_millis(50))
                                    {
                                        if matches!(event, AnalysisEvent::Shutdown) {
                                            analysis_done = true;
                                            debug!("Analysis shutdown confirmed");
                                        }
                                    }
                                    if let Ok(event) = generation
                                        .event_rx
                                        .recv_timeout(Duration::from_millis(50))
                                    {
                                        if matches!(event, GenerationEvent::Shutdown) {
                                            generation_done = true;
                                            debug!("Generation shutdown confirmed");
                                        }
                                    }
                                }

                                let _ = event_tx.send(AppEvent::Shutdown);
                                info!("Orchestrator shutdown complete");
                                return;
                            }

                            Err(_) => {
                                warn!("Command channel disconnected");
                                break;
                            }
                        }
                    }

                    // Capture fragments; appended only while recording
                    recv(chunk_rx) -> chunk => {
                        if let Ok(chunk) = chunk {
                            let is_recording = state.read().session.state().is_recording();
                            if is_recording {
                                if let Err(e) = state.write().append_chunk(chunk) {
                                    warn!("Fragment refused: {}", e);
                                }
                            } else {
                                debug!("Dropping fragment outside Recording state");
                            }
                        }
                    }

                    // Analysis worker events
                    recv(analysis.event_rx) -> event => {
                        match event {
                            Ok(AnalysisEvent::Started) => {
                                debug!("Analysis call in flight");
                            }
                            Ok(AnalysisEvent::Scored(result)) => {
                                let applied = state.write().session_scored(result);
                                match applied {
                                    Ok(()) => {
                                        let _ = event_tx.send(AppEvent::AnalysisComplete);
                                        let _ = event_tx.send(AppEvent::StateChanged);
                                        debug!("Session scored");
                                    }
                                    Err(e) => warn!("Unexpected score event: {}", e),
                                }
                            }
                            Ok(AnalysisEvent::Failed(gateway_error)) => {
                                error!("Analysis failed: {}", gateway_error);
                                // Surfaced verbatim; quota stays untouched
                                let message = gateway_error.to_string();
                                match state.write().session_failed(message.clone()) {
                                    Ok(()) => {
                                        let _ = event_tx.send(AppEvent::Error(message));
                                        let _ = event_tx.send(AppEvent::StateChanged);
                                    }
                                    Err(e) => warn!("Unexpected failure event: {}", e),
                                }
                            }
                            Ok(AnalysisEvent::Shutdown) => {
                                debug!("Analysis shutdown event received");
                            }
                            Err(_) => {
                                warn!("Analysis event channel disconnected");
                            }
                        }
                    }

                    // Generation worker events
                    recv(generation.event_rx) -> event => {
                        match event {
                            Ok(GenerationEvent::LessonReady(record)) => {
                                lesson_seq += 1;
                                let id = format!("gen-{lesson_seq:03}");
                                state
                                    .write()
                                    .add_generated_exercise(Exercise::from_record(id, record));
                                let _ = event_tx.send(AppEvent::LessonReady);
                                let _ = event_tx.send(AppEvent::StateChanged);
                                debug!("Lesson added to catalog");
                            }
                            Ok(GenerationEvent::LessonFailed(gateway_error)) => {
                                error!("Lesson generation failed: {}", gateway_error);
                                let message = gateway_error.to_string();
                                {
                                    let mut s = state.write();
                                    s.generating_lesson = false;
                                    s.set_error(message.clone());
                                }
                                let _ = event_tx.send(AppEvent::Error(message));
                                let _ = event_tx.send(AppEvent::StateChanged);
                            }
                            Ok(GenerationEvent::VideoReady { exercise_id, uri }) => {
                                state.write().set_video_uri(&exercise_id, uri);
                                let _ = event_tx.send(AppEvent::VideoReady(exercise_id));
                                let _ = event_tx.send(AppEvent::StateChanged);
                            }
                            Ok(GenerationEvent::VideoFailed { exercise_id, error }) => {
                                error!("Video generation failed for {}: {}", exercise_id, error);
                                let credential = error.is_credential_problem();
                                let message = if credential {
                                    CoachError::Gateway(error).user_message()
                                } else {
                                    error.to_string()
                                };
                                {
                                    let mut s = state.write();
                                    s.generating_video_for = None;
                                    s.set_error(message.clone());
                                }
                                if credential {
                                    let _ = event_tx.send(AppEvent::CredentialRequired);
                                } else {
                                    let _ = event_tx.send(AppEvent::Error(message));
                                }
                                let _ = event_tx.send(AppEvent::StateChanged);
                            }
                            Ok(GenerationEvent::Shutdown) => {
                                debug!("Generation shutdown event received");
                            }
                            Err(_) => {
                                warn!("Generation event channel disconnected");
                            }
                        }
                    }

                    // Default timeout to prevent busy-waiting
                    default(Duration::from_millis(10)) => {}
                }
            }

            info!("Orchestrator main loop exiting");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.channel_buffer_size, 100);
        assert_eq!(config.shutdown_timeout_ms, 5000);
    }

    #[test]
    fn config_builder() {
        let config = OrchestratorConfig::new()
            .with_channel_buffer_size(200)
            .with_shutdown_timeout_ms(10_000);
        assert_eq!(config.channel_buffer_size, 200);
        assert_eq!(config.shutdown_timeout_ms, 10_000);
    }
}
