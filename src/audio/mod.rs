//! Audio capture, assembly, and review playback
//!
//! This module owns the microphone path: the capture controller holding the
//! device, the append-only chunk buffer that becomes the session blob, the
//! visualizer sample tap, and local playback of a finished take.

pub mod capture;
pub mod chunks;
pub mod playback;
pub mod tap;

pub use capture::MicCapture;
pub use chunks::{AudioBlob, ChunkBuffer, MEDIA_TYPE_WAV};
pub use playback::BlobPlayer;
pub use tap::VisualizerTap;
