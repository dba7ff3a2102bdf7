//! Read-only sample tap for the live visualizer
//!
//! The capture callback writes the samples it just produced; the UI drains
//! them once per frame into a rolling window. The tap is a side channel: it
//! never touches the recorded chunk flow, and the visualizer never gains
//! ownership of the device stream.
//!
//! Lifecycle contract: `attach` before use, `detach` on session stop or
//! teardown. Detach is idempotent; a detached tap discards writes, so nothing
//! keeps feeding a visualizer that is no longer rendering.

use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared sample tap between the audio callback and the UI frame loop
///
/// Cloning shares the underlying buffer; the capture side and the UI side
/// hold clones of the same tap.
#[derive(Clone)]
pub struct VisualizerTap {
    ring: Arc<Mutex<HeapRb<f32>>>,
    attached: Arc<AtomicBool>,
}

impl VisualizerTap {
    /// Create a tap holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Arc::new(Mutex::new(HeapRb::new(capacity))),
            attached: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Begin a visualization pass: clear stale samples and accept writes
    pub fn attach(&self) {
        self.ring.lock().clear();
        self.attached.store(true, Ordering::SeqCst);
    }

    /// End the visualization pass
    ///
    /// Idempotent; detaching an already-detached tap is a no-op.
    pub fn detach(&self) {
        if self.attached.swap(false, Ordering::SeqCst) {
            self.ring.lock().clear();
        }
    }

    /// Whether a visualization pass is active
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Write samples from the capture callback
    ///
    /// When the ring is full the oldest samples are dropped; the visualizer
    /// only ever needs the most recent window. Writes to a detached tap are
    /// discarded.
    pub fn write(&self, samples: &[f32]) {
        if !self.is_attached() {
            return;
        }
        let mut ring = self.ring.lock();
        for &sample in samples {
            if ring.try_push(sample).is_err() {
                let _ = ring.try_pop();
                let _ = ring.try_push(sample);
            }
        }
    }

    /// Drain pending samples into a rolling window, keeping at most
    /// `max_window` of the newest samples
    ///
    /// Called once per UI frame; frames with nothing pending leave the window
    /// untouched, which makes skipped frames idempotent.
    pub fn drain_into(&self, window: &mut Vec<f32>, max_window: usize) {
        {
            let mut ring = self.ring.lock();
            while let Some(sample) = ring.try_pop() {
                window.push(sample);
            }
        }
        if window.len() > max_window {
            let excess = window.len() - max_window;
            window.drain(0..excess);
        }
    }

    /// Samples currently pending in the ring
    pub fn pending(&self) -> usize {
        self.ring.lock().occupied_len()
    }
}
