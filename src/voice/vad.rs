//! Voice-activity detection
//!
//! Segments continuous microphone input into discrete utterances using RMS
//! energy thresholds. No wake word: any sustained speech followed by enough
//! trailing silence yields a segment.

/// Minimum RMS energy to consider a chunk speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum voiced samples for a segment to count as an utterance
/// (0.3 seconds at 16kHz; shorter blips are discarded)
const MIN_VOICED_SAMPLES: usize = 4800;

/// Trailing silence that ends an utterance (0.5 seconds at 16kHz)
const HANGOVER_SAMPLES: usize = 8000;

/// Silence after which a too-short segment is abandoned (1 second at 16kHz)
const ABANDON_SAMPLES: usize = 16000;

/// Detector state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadState {
    /// Waiting for speech
    Idle,
    /// Accumulating an utterance
    Speech,
}

/// Segments microphone audio into utterances
pub struct VoiceActivityDetector {
    state: VadState,
    buffer: Vec<f32>,
    voiced_samples: usize,
    silence_samples: usize,
}

impl Default for VoiceActivityDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceActivityDetector {
    /// Create a detector in the idle state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: VadState::Idle,
            buffer: Vec::new(),
            voiced_samples: 0,
            silence_samples: 0,
        }
    }

    /// Feed captured samples; returns a completed utterance when the
    /// trailing-silence boundary is reached
    pub fn push(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        let is_speech = rms_energy(samples) > ENERGY_THRESHOLD;

        match self.state {
            VadState::Idle => {
                if is_speech {
                    self.state = VadState::Speech;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.voiced_samples = samples.len();
                    self.silence_samples = 0;
                    tracing::trace!(samples = samples.len(), "speech started");
                }
                None
            }
            VadState::Speech => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.voiced_samples += samples.len();
                    self.silence_samples = 0;
                } else {
                    self.silence_samples += samples.len();
                }

                if self.silence_samples >= HANGOVER_SAMPLES {
                    if self.voiced_samples >= MIN_VOICED_SAMPLES {
                        let utterance = std::mem::take(&mut self.buffer);
                        tracing::debug!(
                            samples = utterance.len(),
                            voiced = self.voiced_samples,
                            "utterance complete"
                        );
                        self.reset();
                        return Some(utterance);
                    }

                    if self.silence_samples >= ABANDON_SAMPLES {
                        tracing::trace!(voiced = self.voiced_samples, "segment too short, abandoned");
                        self.reset();
                    }
                }

                None
            }
        }
    }

    /// Drop any partial segment and return to idle
    pub fn reset(&mut self) {
        self.state = VadState::Idle;
        self.buffer.clear();
        self.voiced_samples = 0;
        self.silence_samples = 0;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> VadState {
        self.state
    }

    /// Samples buffered for the in-progress segment
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// RMS energy of a chunk of samples
#[allow(clippy::cast_precision_loss)]
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_of_silence_is_near_zero() {
        let silence = vec![0.0f32; 256];
        assert!(rms_energy(&silence) < 0.001);

        let loud = vec![0.5f32; 256];
        assert!(rms_energy(&loud) > 0.4);
    }

    #[test]
    fn silence_never_segments() {
        let mut vad = VoiceActivityDetector::new();
        for _ in 0..100 {
            assert!(vad.push(&vec![0.0f32; 1600]).is_none());
        }
        assert_eq!(vad.state(), VadState::Idle);
    }
}
