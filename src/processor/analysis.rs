//! Analysis worker
//!
//! Runs the remote scoring call off the orchestration thread. The worker
//! owns a tokio runtime on a dedicated thread (network I/O must not block
//! the orchestrator loop) and talks through bounded command/event channels.
//!
//! The transfer encoding of the blob happens here, on the blocking pool:
//! that conversion completing is the suspension point before the network
//! call is issued.

use crate::audio::AudioBlob;
use crate::error::{CoachError, GatewayError, Result};
use crate::gateway::AnalysisBackend;
use crate::state::AnalysisResult;
use base64::Engine;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info};

/// Commands sent to the analysis worker
#[derive(Clone, Debug)]
pub enum AnalysisCommand {
    /// Encode and score a finalized blob
    Analyze(AudioBlob),
    /// Shut the worker down
    Shutdown,
}

/// Events emitted by the analysis worker
#[derive(Clone, Debug)]
pub enum AnalysisEvent {
    /// The call left for the gateway
    Started,
    /// The gateway returned a result
    Scored(AnalysisResult),
    /// The gateway call failed
    Failed(GatewayError),
    /// Worker shut down
    Shutdown,
}

/// Handle for the running analysis worker
pub struct AnalysisHandle {
    pub command_tx: Sender<AnalysisCommand>,
    pub event_rx: Receiver<AnalysisEvent>,
    worker_handle: Option<JoinHandle<()>>,
}

impl AnalysisHandle {
    /// Queue a blob for analysis
    pub fn analyze(&self, blob: AudioBlob) -> Result<()> {
        self.command_tx
            .send(AnalysisCommand::Analyze(blob))
            .map_err(|e| CoachError::Channel(format!("failed to send analyze command: {e}")))
    }

    /// Shut the worker down and join it
    pub fn shutdown(mut self) -> Result<()> {
        let _ = self.command_tx.send(AnalysisCommand::Shutdown);
        if let Some(handle) = self.worker_handle.take() {
            handle
                .join()
                .map_err(|_| CoachError::Channel("analysis worker panicked".to_string()))?;
        }
        Ok(())
    }

    /// Try to receive an event without blocking
    pub fn try_recv_event(&self) -> Option<AnalysisEvent> {
        self.event_rx.try_recv().ok()
    }
}

/// Spawns the analysis worker thread
pub struct AnalysisRunner {
    backend: Arc<dyn AnalysisBackend>,
}

impl AnalysisRunner {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        Self { backend }
    }

    /// Start the worker thread with its own runtime
    pub fn start_worker(self) -> Result<AnalysisHandle> {
        let (command_tx, command_rx) = bounded::<AnalysisCommand>(16);
        let (event_tx, event_rx) = bounded::<AnalysisEvent>(64);

        let backend = self.backend;
        let worker_handle = std::thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to create analysis runtime: {}", e);
                    let _ = event_tx.send(AnalysisEvent::Failed(GatewayError::Network(format!(
                        "failed to create runtime: {e}"
                    ))));
                    let _ = event_tx.send(AnalysisEvent::Shutdown);
                    return;
                }
            };

            runtime.block_on(worker_loop(backend, command_rx, event_tx));
        });

        Ok(AnalysisHandle {
            command_tx,
            event_rx,
            worker_handle: Some(worker_handle),
        })
    }
}

async fn worker_loop(
    backend: Arc<dyn AnalysisBackend>,
    command_rx: Receiver<AnalysisCommand>,
    event_tx: Sender<AnalysisEvent>,
) {
    info!("Analysis worker starting");

    loop {
        let command = match command_rx.recv() {
            Ok(cmd) => cmd,
            Err(_) => {
                info!("Analysis command channel closed, shutting down");
                break;
            }
        };

        match command {
            AnalysisCommand::Analyze(blob) => {
                debug!(
                    "Analyzing blob: {} bytes, {:.1}s",
                    blob.len(),
                    blob.duration_secs()
                );

                if event_tx.send(AnalysisEvent::Started).is_err() {
                    error!("Analysis event channel closed");
                    break;
                }

                let media_type = blob.media_type().to_string();
                let encoded = tokio::task::spawn_blocking(move || {
                    base64::engine::general_purpose::STANDARD.encode(blob.bytes())
                })
                .await;

                let event = match encoded {
                    Ok(audio_b64) => match backend.analyze(&audio_b64, &media_type).await {
                        Ok(result) => AnalysisEvent::Scored(result),
                        Err(e) => AnalysisEvent::Failed(e),
                    },
                    Err(e) => AnalysisEvent::Failed(GatewayError::Network(format!(
                        "encoding task failed: {e}"
                    ))),
                };

                if event_tx.send(event).is_err() {
                    error!("Analysis event channel closed");
                    break;
                }
            }

            AnalysisCommand::Shutdown => {
                info!("Analysis worker received shutdown");
                break;
            }
        }
    }

    let _ = event_tx.send(AnalysisEvent::Shutdown);
    info!("Analysis worker shutdown complete");
}
