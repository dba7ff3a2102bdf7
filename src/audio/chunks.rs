//! Ordered chunk assembly for a recording session
//!
//! Audio fragments arrive incrementally while recording. The buffer is
//! append-only until the session stops, at which point the fragments are
//! concatenated in emission order and sealed into an immutable WAV blob.

use crate::error::{CoachError, Result};
use std::io::Cursor;

/// Media type declared on finalized blobs
pub const MEDIA_TYPE_WAV: &str = "audio/wav";

/// Immutable finalized audio payload with a declared media-type tag
///
/// Created exactly once per session, on stop. Cloning is cheap enough for the
/// single-flight submit path (one blob alive at a time).
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBlob {
    bytes: Vec<u8>,
    media_type: String,
    duration_secs: f32,
}

impl AudioBlob {
    /// Encoded audio bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared media type, e.g. `audio/wav`
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Recorded duration in seconds (zero for an empty recording)
    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }

    /// Size of the encoded payload in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty (never true for WAV; the header remains)
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Append-only buffer of ordered audio fragments
///
/// Fragments are mono f32 samples as emitted by the capture device. Order is
/// emission order; nothing is reordered or deduplicated.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<f32>>,
}

impl ChunkBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one fragment at the end of the sequence
    pub fn append(&mut self, chunk: Vec<f32>) {
        self.chunks.push(chunk);
    }

    /// Number of fragments appended so far
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total samples across all fragments
    pub fn total_samples(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Whether no fragment has been appended
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Concatenate all fragments in emission order
    pub fn concat(&self) -> Vec<f32> {
        let mut samples = Vec::with_capacity(self.total_samples());
        for chunk in &self.chunks {
            samples.extend_from_slice(chunk);
        }
        samples
    }

    /// Drop all fragments
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Seal the buffer into a WAV blob at the given sample rate
    ///
    /// A session stopped before any fragment arrived still produces a valid
    /// (zero-duration) blob.
    ///
    /// # Errors
    /// Returns an audio-processing error if WAV encoding fails.
    pub fn finalize(&self, sample_rate: u32) -> Result<AudioBlob> {
        let samples = self.concat();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut bytes = Vec::new();
        {
            let cursor = Cursor::new(&mut bytes);
            let mut writer = hound::WavWriter::new(cursor, spec)
                .map_err(|e| CoachError::AudioProcessing(format!("wav writer: {e}")))?;
            for &sample in &samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| CoachError::AudioProcessing(format!("wav write: {e}")))?;
            }
            writer
                .finalize()
                .map_err(|e| CoachError::AudioProcessing(format!("wav finalize: {e}")))?;
        }

        let duration_secs = if sample_rate > 0 {
            samples.len() as f32 / sample_rate as f32
        } else {
            0.0
        };

        Ok(AudioBlob {
            bytes,
            media_type: MEDIA_TYPE_WAV.to_string(),
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_back(blob: &AudioBlob) -> (Vec<f32>, u32) {
        let reader = hound::WavReader::new(Cursor::new(blob.bytes().to_vec())).unwrap();
        let rate = reader.spec().sample_rate;
        let samples: Vec<f32> = reader.into_samples::<f32>().map(|s| s.unwrap()).collect();
        (samples, rate)
    }

    #[test]
    fn fragments_concatenate_in_emission_order() {
        let mut buffer = ChunkBuffer::new();
        buffer.append(vec![0.1, 0.2]);
        buffer.append(vec![0.3]);
        buffer.append(vec![0.4, 0.5, 0.6]);

        assert_eq!(buffer.chunk_count(), 3);
        assert_eq!(buffer.total_samples(), 6);
        assert_eq!(buffer.concat(), vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn finalized_blob_round_trips_exactly() {
        let mut buffer = ChunkBuffer::new();
        buffer.append(vec![0.25, -0.5]);
        buffer.append(vec![1.0, -1.0, 0.0]);

        let blob = buffer.finalize(16_000).unwrap();
        assert_eq!(blob.media_type(), MEDIA_TYPE_WAV);

        let (samples, rate) = read_back(&blob);
        assert_eq!(rate, 16_000);
        // Float WAV carries samples bit-exactly, so emission order is provable
        // on the sealed payload, not just the in-memory buffer.
        assert_eq!(samples, vec![0.25, -0.5, 1.0, -1.0, 0.0]);
    }

    #[test]
    fn zero_fragments_still_seal_into_a_valid_blob() {
        let buffer = ChunkBuffer::new();
        let blob = buffer.finalize(48_000).unwrap();

        assert!(!blob.is_empty(), "header-only WAV is still a payload");
        assert_eq!(blob.duration_secs(), 0.0);

        let (samples, rate) = read_back(&blob);
        assert_eq!(rate, 48_000);
        assert!(samples.is_empty());
    }

    #[test]
    fn duration_reflects_sample_count() {
        let mut buffer = ChunkBuffer::new();
        buffer.append(vec![0.0; 8_000]);

        let blob = buffer.finalize(16_000).unwrap();
        assert!((blob.duration_secs() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn clear_resets_the_buffer() {
        let mut buffer = ChunkBuffer::new();
        buffer.append(vec![0.1]);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.total_samples(), 0);
    }
}
