//! Audio playback with barge-in preemption

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

/// Poll interval while waiting for playback to drain
const DRAIN_POLL_MS: u64 = 50;

/// Preemption flag for an in-flight playback
///
/// A new utterance interrupts playback: the session loop calls [`stop`] and
/// the output callback goes silent at the next chunk boundary.
///
/// [`stop`]: PlaybackHandle::stop
#[derive(Debug, Clone, Default)]
pub struct PlaybackHandle(Arc<AtomicBool>);

impl PlaybackHandle {
    /// Create a fresh, un-stopped handle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that playback stop at the next chunk boundary
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether a stop has been requested
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Plays raw PCM audio to the default output device
pub struct AudioPlayback {
    config: StreamConfig,
    sample_rate: u32,
}

impl AudioPlayback {
    /// Create a new playback instance for the given PCM sample rate
    ///
    /// # Errors
    ///
    /// Returns error if no output device supports the rate
    pub fn new(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                (c.channels() == 1 || c.channels() == 2)
                    && c.min_sample_rate() <= SampleRate(sample_rate)
                    && c.max_sample_rate() >= SampleRate(sample_rate)
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(sample_rate))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self { config, sample_rate })
    }

    /// Play mono f32 samples, blocking until drained or preempted
    ///
    /// The `handle` is checked at every output-callback chunk; once stopped,
    /// remaining samples are discarded and the call returns.
    ///
    /// # Errors
    ///
    /// Returns error if the output stream cannot be built
    pub fn play(&self, samples: Vec<f32>, handle: &PlaybackHandle) -> Result<()> {
        if samples.is_empty() || handle.is_stopped() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device".to_string()))?;

        let config = self.config.clone();
        let channels = config.channels as usize;
        let total = samples.len();

        let samples = Arc::new(samples);
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let stop = handle.clone();

        let cb_samples = Arc::clone(&samples);
        let cb_position = Arc::clone(&position);
        let cb_finished = Arc::clone(&finished);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if stop.is_stopped() {
                        data.fill(0.0);
                        cb_finished.store(true, Ordering::Relaxed);
                        return;
                    }

                    let mut pos = cb_position.load(Ordering::Relaxed);
                    for frame in data.chunks_mut(channels) {
                        let sample = if pos < cb_samples.len() {
                            let s = cb_samples[pos];
                            pos += 1;
                            s
                        } else {
                            cb_finished.store(true, Ordering::Relaxed);
                            0.0
                        };
                        frame.fill(sample);
                    }
                    cb_position.store(pos, Ordering::Relaxed);
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Drain with a timeout bound derived from the payload length
        let duration_ms = (total as u64 * 1000) / u64::from(self.sample_rate);
        let deadline =
            std::time::Instant::now() + std::time::Duration::from_millis(duration_ms + 500);

        while !finished.load(Ordering::Relaxed) && !handle.is_stopped() {
            if std::time::Instant::now() > deadline {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(DRAIN_POLL_MS));
        }

        drop(stream);
        tracing::debug!(
            samples = total,
            preempted = handle.is_stopped(),
            "playback finished"
        );

        Ok(())
    }
}

/// Decode raw PCM f32 little-endian bytes into samples
///
/// A trailing partial frame (fewer than four bytes) is discarded.
#[must_use]
pub fn pcm_f32le_to_samples(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
