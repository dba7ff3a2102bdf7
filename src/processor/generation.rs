//! Lesson and video generation worker
//!
//! Same shape as the analysis worker: a dedicated thread with its own tokio
//! runtime behind bounded command/event channels. Video generation is
//! long-running; the handle exposes a cancel flag that the gateway's poll
//! loop checks between attempts, so shutdown never waits out a stuck
//! operation.

use crate::error::{CoachError, GatewayError, Result};
use crate::gateway::GenerationBackend;
use crate::lessons::LessonRecord;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info};

/// Commands sent to the generation worker
#[derive(Clone, Debug)]
pub enum GenerationCommand {
    /// Generate a lesson
    Lesson { level: String, topic: String },
    /// Generate a demonstration video for an exercise
    Video {
        exercise_id: String,
        title: String,
        description: String,
    },
    /// Shut the worker down
    Shutdown,
}

/// Events emitted by the generation worker
#[derive(Clone, Debug)]
pub enum GenerationEvent {
    /// A lesson landed
    LessonReady(LessonRecord),
    /// Lesson generation failed
    LessonFailed(GatewayError),
    /// A video landed for this exercise
    VideoReady { exercise_id: String, uri: String },
    /// Video generation failed for this exercise
    VideoFailed {
        exercise_id: String,
        error: GatewayError,
    },
    /// Worker shut down
    Shutdown,
}

/// Handle for the running generation worker
pub struct GenerationHandle {
    pub command_tx: Sender<GenerationCommand>,
    pub event_rx: Receiver<GenerationEvent>,
    cancel_video: Arc<AtomicBool>,
    worker_handle: Option<JoinHandle<()>>,
}

impl GenerationHandle {
    /// Queue a lesson generation
    pub fn generate_lesson(&self, level: String, topic: String) -> Result<()> {
        self.command_tx
            .send(GenerationCommand::Lesson { level, topic })
            .map_err(|e| CoachError::Channel(format!("failed to send lesson command: {e}")))
    }

    /// Queue a video generation
    pub fn generate_video(
        &self,
        exercise_id: String,
        title: String,
        description: String,
    ) -> Result<()> {
        self.command_tx
            .send(GenerationCommand::Video {
                exercise_id,
                title,
                description,
            })
            .map_err(|e| CoachError::Channel(format!("failed to send video command: {e}")))
    }

    /// Abort any in-flight video poll loop at its next attempt
    pub fn cancel_video(&self) {
        self.cancel_video.store(true, Ordering::SeqCst);
    }

    /// Shut the worker down and join it
    ///
    /// Cancels the video poll loop first so the join is bounded by one poll
    /// interval rather than the full poll budget.
    pub fn shutdown(mut self) -> Result<()> {
        self.cancel_video();
        let _ = self.command_tx.send(GenerationCommand::Shutdown);
        if let Some(handle) = self.worker_handle.take() {
            handle
                .join()
                .map_err(|_| CoachError::Channel("generation worker panicked".to_string()))?;
        }
        Ok(())
    }

    /// Try to receive an event without blocking
    pub fn try_recv_event(&self) -> Option<GenerationEvent> {
        self.event_rx.try_recv().ok()
    }
}

/// Spawns the generation worker thread
pub struct GenerationRunner {
    backend: Arc<dyn GenerationBackend>,
}

impl GenerationRunner {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Start the worker thread with its own runtime
    pub fn start_worker(self) -> Result<GenerationHandle> {
        let (command_tx, command_rx) = bounded::<GenerationCommand>(16);
        let (event_tx, event_rx) = bounded::<GenerationEvent>(64);
        let cancel_video = Arc::new(AtomicBool::new(false));

        let backend = self.backend;
        let cancel = Arc::clone(&cancel_video);
        let worker_handle = std::thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to create generation runtime: {}", e);
                    let _ = event_tx.send(GenerationEvent::Shutdown);
                    return;
                }
            };

            runtime.block_on(worker_loop(backend, command_rx, event_tx, cancel));
        });

        Ok(GenerationHandle {
            command_tx,
            event_rx,
            cancel_video,
            worker_handle: Some(worker_handle),
        })
    }
}

async fn worker_loop(
    backend: Arc<dyn GenerationBackend>,
    command_rx: Receiver<GenerationCommand>,
    event_tx: Sender<GenerationEvent>,
    cancel_video: Arc<AtomicBool>,
) {
    info!("Generation worker starting");

    loop {
        let command = match command_rx.recv() {
            Ok(cmd) => cmd,
            Err(_) => {
                info!("Generation command channel closed, shutting down");
                break;
            }
        };

        match command {
            GenerationCommand::Lesson { level, topic } => {
                debug!("Generating lesson ({level}/{topic})");
                let event = match backend.generate_lesson(&level, &topic).await {
                    Ok(record) => GenerationEvent::LessonReady(record),
                    Err(e) => GenerationEvent::LessonFailed(e),
                };
                if event_tx.send(event).is_err() {
                    error!("Generation event channel closed");
                    break;
                }
            }

            GenerationCommand::Video {
                exercise_id,
                title,
                description,
            } => {
                debug!("Generating video for exercise {exercise_id}");
                cancel_video.store(false, Ordering::SeqCst);
                let event = match backend
                    .generate_video(&title, &description, Arc::clone(&cancel_video))
                    .await
                {
                    Ok(uri) => GenerationEvent::VideoReady { exercise_id, uri },
                    Err(error) => GenerationEvent::VideoFailed { exercise_id, error },
                };
                if event_tx.send(event).is_err() {
                    error!("Generation event channel closed");
                    break;
                }
            }

            GenerationCommand::Shutdown => {
                info!("Generation worker received shutdown");
                break;
            }
        }
    }

    let _ = event_tx.send(GenerationEvent::Shutdown);
    info!("Generation worker shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lessons::Difficulty;
    use async_trait::async_trait;
    use std::time::Duration;

    struct CannedBackend;

    #[async_trait]
    impl GenerationBackend for CannedBackend {
        async fn generate_lesson(
            &self,
            level: &str,
            topic: &str,
        ) -> std::result::Result<LessonRecord, GatewayError> {
            Ok(LessonRecord {
                title: format!("{topic} for {level}"),
                difficulty: Difficulty::Intermediate,
                description: "d".into(),
                theory: "t".into(),
                lesson_steps: vec!["a".into(), "b".into(), "c".into()],
                tablature: "1\n2\n3\n4\n5\n6".into(),
            })
        }

        async fn generate_video(
            &self,
            _title: &str,
            _description: &str,
            cancel: Arc<AtomicBool>,
        ) -> std::result::Result<String, GatewayError> {
            if cancel.load(Ordering::SeqCst) {
                return Err(GatewayError::Cancelled);
            }
            Ok("https://media/clip.mp4".to_string())
        }
    }

    #[test]
    fn lesson_and_video_commands_round_trip() {
        let handle = GenerationRunner::new(Arc::new(CannedBackend))
            .start_worker()
            .unwrap();

        handle
            .generate_lesson("Beginner".into(), "Arpeggios".into())
            .unwrap();
        match handle.event_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            GenerationEvent::LessonReady(record) => {
                assert_eq!(record.title, "Arpeggios for Beginner");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        handle
            .generate_video("ex-1".into(), "T".into(), "D".into())
            .unwrap();
        match handle.event_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            GenerationEvent::VideoReady { exercise_id, uri } => {
                assert_eq!(exercise_id, "ex-1");
                assert_eq!(uri, "https://media/clip.mp4");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        handle.shutdown().unwrap();
    }

    #[test]
    fn video_command_resets_a_stale_cancel_flag() {
        let handle = GenerationRunner::new(Arc::new(CannedBackend))
            .start_worker()
            .unwrap();

        // A previous cancel must not poison the next video request
        handle.cancel_video();
        handle
            .generate_video("ex-2".into(), "T".into(), "D".into())
            .unwrap();
        match handle.event_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            GenerationEvent::VideoReady { exercise_id, .. } => {
                assert_eq!(exercise_id, "ex-2");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        handle.shutdown().unwrap();
    }
}
