//! Local playback of a finalized recording
//!
//! Lets the user review a stopped take before committing it for analysis.
//! Decodes the sealed WAV blob and plays it through the default output
//! device, stepping through the source at the ratio between the recorded and
//! the device sample rate.

use crate::audio::AudioBlob;
use crate::error::{CoachError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// One-shot player for the finalized session blob
pub struct BlobPlayer {
    stream: Option<Stream>,
    finished: Arc<AtomicBool>,
}

impl BlobPlayer {
    /// Create an idle player
    pub fn new() -> Self {
        Self {
            stream: None,
            finished: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Start playing the blob from the beginning
    ///
    /// Any playback already in progress is stopped first.
    ///
    /// # Errors
    /// Fails if the blob cannot be decoded or no output device is usable.
    pub fn play(&mut self, blob: &AudioBlob) -> Result<()> {
        self.stop();

        let (samples, source_rate) = decode_wav(blob)?;
        if samples.is_empty() {
            debug!("Blob has no samples, nothing to play");
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            CoachError::DeviceUnavailable("no output device available".into())
        })?;

        let supported = device.default_output_config().map_err(|e| {
            CoachError::DeviceUnavailable(format!("failed to get output config: {e}"))
        })?;
        if supported.sample_format() != SampleFormat::F32 {
            return Err(CoachError::AudioProcessing(format!(
                "unsupported output sample format {:?}",
                supported.sample_format()
            )));
        }
        let config = supported.config();
        let channels = config.channels as usize;
        let device_rate = config.sample_rate.0;

        let finished = Arc::new(AtomicBool::new(false));
        self.finished = Arc::clone(&finished);

        // Fractional read head; nearest-neighbor stepping is plenty for a
        // review listen.
        let step = source_rate as f64 / device_rate as f64;
        let mut position = 0.0_f64;

        let err_fn = |err| {
            tracing::error!("Audio output stream error: {}", err);
        };

        let stream = device
            .build_output_stream(
                &config,
                move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in out.chunks_mut(channels) {
                        let index = position as usize;
                        let value = if index < samples.len() {
                            position += step;
                            samples[index]
                        } else {
                            finished.store(true, Ordering::SeqCst);
                            0.0
                        };
                        for slot in frame.iter_mut() {
                            *slot = value;
                        }
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| {
                CoachError::DeviceUnavailable(format!("failed to build output stream: {e}"))
            })?;

        stream.play().map_err(|e| {
            CoachError::DeviceUnavailable(format!("failed to start output stream: {e}"))
        })?;

        self.stream = Some(stream);
        info!("Playback started ({:.1}s)", blob.duration_secs());
        Ok(())
    }

    /// Stop playback and release the output device
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            debug!("Playback stopped");
        }
        self.finished.store(true, Ordering::SeqCst);
    }

    /// Whether playback is still running
    pub fn is_playing(&self) -> bool {
        self.stream.is_some() && !self.finished.load(Ordering::SeqCst)
    }
}

impl Default for BlobPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BlobPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Decode a float WAV blob back into mono samples
fn decode_wav(blob: &AudioBlob) -> Result<(Vec<f32>, u32)> {
    let reader = hound::WavReader::new(Cursor::new(blob.bytes().to_vec()))
        .map_err(|e| CoachError::AudioProcessing(format!("wav decode: {e}")))?;
    let rate = reader.spec().sample_rate;
    let samples = reader
        .into_samples::<f32>()
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|e| CoachError::AudioProcessing(format!("wav samples: {e}")))?;
    Ok((samples, rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ChunkBuffer;

    #[test]
    fn decode_recovers_the_recorded_samples() {
        let mut buffer = ChunkBuffer::new();
        buffer.append(vec![0.5, -0.5, 0.25]);
        let blob = buffer.finalize(22_050).unwrap();

        let (samples, rate) = decode_wav(&blob).unwrap();
        assert_eq!(rate, 22_050);
        assert_eq!(samples, vec![0.5, -0.5, 0.25]);
    }

    #[test]
    fn empty_blob_plays_as_a_no_op() {
        let blob = ChunkBuffer::new().finalize(48_000).unwrap();
        let mut player = BlobPlayer::new();
        // No samples means play() returns before touching the device, so this
        // holds on machines without audio hardware too.
        assert!(player.play(&blob).is_ok());
        assert!(!player.is_playing());
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let mut buffer = ChunkBuffer::new();
        buffer.append(vec![0.0]);
        let blob = buffer.finalize(8_000).unwrap();

        // Re-wrap the blob with a corrupted header
        let mut bytes = blob.bytes().to_vec();
        bytes[0] = b'X';
        let reader = hound::WavReader::new(Cursor::new(bytes));
        assert!(reader.is_err());
    }
}
