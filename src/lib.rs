//! FretCoach - AI-powered guitar practice coach
//!
//! Record a take from the microphone, watch the live spectrum while playing,
//! submit the finished recording to a hosted model for scored feedback, and
//! browse or generate lesson content. Billable operations sit behind a
//! simulated subscription tier with free-tier quotas.

pub mod audio;
pub mod config;
pub mod error;
pub mod gateway;
pub mod lessons;
pub mod processor;
pub mod state;
pub mod ui;

// Re-export error types
pub use error::{Billable, CoachError, GatewayError, Result, TransitionError};

// Re-export audio types
pub use audio::{AudioBlob, BlobPlayer, ChunkBuffer, MicCapture, VisualizerTap};

// Re-export state types
pub use state::{
    AnalysisResult, AppCommand, AppEvent, AppState, AppStateSnapshot, RecordingSession,
    SessionEvent, SessionState, SharedAppState, UserAccount, MAX_FREE_LESSONS,
    MAX_FREE_RECORDINGS,
};
