//! Processing pipeline for FretCoach
//!
//! This module contains the concurrent side of the application:
//! - The analysis worker (remote scoring of finalized takes)
//! - The generation worker (lessons and demonstration videos)
//! - The orchestrator that coordinates them against the session state machine

pub mod analysis;
pub mod generation;
pub mod orchestrator;

pub use analysis::{AnalysisCommand, AnalysisEvent, AnalysisHandle, AnalysisRunner};
pub use generation::{GenerationCommand, GenerationEvent, GenerationHandle, GenerationRunner};
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorHandle};
