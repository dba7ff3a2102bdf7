//! Microphone capture
//!
//! Cross-platform audio input via cpal. The capture controller owns the
//! device and the input stream exclusively; the visualizer tap receives
//! samples read-only and the recorded chunks flow out through a channel.

use crate::audio::VisualizerTap;
use crate::error::{CoachError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sample formats in preference order
///
/// Platforms report disjoint format sets; walking an ordered preference list
/// with a fallback to the device default is what keeps capture portable.
const PREFERRED_FORMATS: [SampleFormat; 3] =
    [SampleFormat::F32, SampleFormat::I16, SampleFormat::U16];

/// Microphone capture controller
///
/// Holds the input device and, while recording, the platform stream.
/// Dropping the stream releases the underlying device; anything else leaks
/// the hardware and keeps the recording indicator lit.
pub struct MicCapture {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    capturing: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
}

impl MicCapture {
    /// Open the default input device and negotiate a stream format
    ///
    /// # Errors
    /// Fails with `DeviceUnavailable` when no input device exists (or
    /// permission is denied) or no usable configuration can be negotiated.
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();

        let device = host.default_input_device().ok_or_else(|| {
            CoachError::DeviceUnavailable("no input device available".into())
        })?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let (config, sample_format) = negotiate_format(&device)?;
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;

        info!(
            "Opened input device {}: {}Hz, {} channel(s), {:?}",
            device_name, sample_rate, channels, sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
            capturing: Arc::new(AtomicBool::new(false)),
            sample_rate,
            channels,
        })
    }

    /// Start capturing
    ///
    /// Fragments of mono f32 samples are emitted incrementally through
    /// `chunk_tx` and mirrored into the visualizer tap. The audio callback
    /// never blocks; if the channel is full the fragment is dropped with a
    /// warning rather than stalling the device thread.
    ///
    /// # Errors
    /// Fails with `DeviceUnavailable` if the stream cannot be built or
    /// started.
    pub fn start(&mut self, chunk_tx: Sender<Vec<f32>>, tap: VisualizerTap) -> Result<()> {
        if self.capturing.load(Ordering::SeqCst) {
            warn!("Already capturing, ignoring start request");
            return Ok(());
        }

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(chunk_tx, tap),
            SampleFormat::I16 => self.build_stream::<i16>(chunk_tx, tap),
            SampleFormat::U16 => self.build_stream::<u16>(chunk_tx, tap),
            other => Err(CoachError::DeviceUnavailable(format!(
                "unsupported sample format {other:?}"
            ))),
        }?;

        stream.play().map_err(|e| {
            CoachError::DeviceUnavailable(format!("failed to start input stream: {e}"))
        })?;

        self.capturing.store(true, Ordering::SeqCst);
        self.stream = Some(stream);
        info!("Capture started");
        Ok(())
    }

    /// Stop capturing and release the device
    pub fn stop(&mut self) {
        self.capturing.store(false, Ordering::SeqCst);
        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Capture stopped, device released");
        }
    }

    /// Whether a stream is currently live
    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    /// Negotiated sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Negotiated channel count
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Negotiated sample format
    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    fn build_stream<T>(
        &self,
        chunk_tx: Sender<Vec<f32>>,
        tap: VisualizerTap,
    ) -> Result<Stream>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let channels = self.channels as usize;
        let capturing = Arc::clone(&self.capturing);

        let err_fn = |err| {
            tracing::error!("Audio input stream error: {}", err);
        };

        debug!(
            "Building input stream: {}Hz, {} channel(s), {:?}",
            self.sample_rate, channels, self.sample_format
        );

        self.device
            .build_input_stream(
                &self.config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    if !capturing.load(Ordering::SeqCst) {
                        return;
                    }

                    // Downmix to mono, converting to f32 on the way
                    let samples: Vec<f32> = if channels == 1 {
                        data.iter().map(|&s| f32::from_sample(s)).collect()
                    } else {
                        data.chunks(channels)
                            .map(|frame| {
                                frame.iter().map(|&s| f32::from_sample(s)).sum::<f32>()
                                    / channels as f32
                            })
                            .collect()
                    };

                    tap.write(&samples);

                    if let Err(e) = chunk_tx.try_send(samples) {
                        warn!("Dropped audio fragment: {}", e);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| {
                CoachError::DeviceUnavailable(format!("failed to build input stream: {e}"))
            })
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Pick a stream configuration for the device
///
/// Walks `PREFERRED_FORMATS` against what the device reports as supported and
/// takes the first match at its maximum sample rate; if the device reports
/// nothing usable, falls back to its default configuration.
fn negotiate_format(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
    if let Ok(ranges) = device.supported_input_configs() {
        let ranges: Vec<_> = ranges.collect();
        for format in PREFERRED_FORMATS {
            if let Some(range) = ranges.iter().find(|r| r.sample_format() == format) {
                let supported = range.clone().with_max_sample_rate();
                debug!("Negotiated preferred format {:?}", format);
                return Ok((supported.config(), format));
            }
        }
        if !ranges.is_empty() {
            debug!("No preferred format supported, falling back to device default");
        }
    }

    let default = device.default_input_config().map_err(|e| {
        CoachError::DeviceUnavailable(format!("failed to get input config: {e}"))
    })?;
    let format = default.sample_format();
    Ok((default.config(), format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    // Device-dependent tests are written to pass with or without hardware;
    // CI machines usually have none.

    #[test]
    fn open_reports_a_sane_configuration() {
        match MicCapture::open() {
            Ok(capture) => {
                assert!(capture.sample_rate() > 0);
                assert!(capture.channels() > 0);
                assert!(!capture.is_capturing());
            }
            Err(e) => {
                assert!(matches!(e, CoachError::DeviceUnavailable(_)));
            }
        }
    }

    #[test]
    fn stop_without_start_is_harmless() {
        if let Ok(mut capture) = MicCapture::open() {
            capture.stop();
            assert!(!capture.is_capturing());
        }
    }

    #[test]
    fn start_stop_releases_the_stream() {
        if let Ok(mut capture) = MicCapture::open() {
            let (tx, _rx) = bounded(64);
            let tap = VisualizerTap::new(1024);
            if capture.start(tx, tap).is_ok() {
                assert!(capture.is_capturing());
                capture.stop();
                assert!(!capture.is_capturing());
            }
        }
    }
}
