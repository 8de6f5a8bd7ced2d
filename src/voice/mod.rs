//! Voice processing module
//!
//! Client side: microphone capture, utterance segmentation, and playback.
//! Server side: the transcription and speech synthesis adapters.

mod capture;
mod playback;
pub mod stt;
pub mod tts;
mod vad;

pub use capture::{samples_to_wav, AudioCapture, SAMPLE_RATE};
pub use playback::{pcm_f32le_to_samples, AudioPlayback, PlaybackHandle};
pub use stt::Transcriber;
pub use tts::{SpeechStream, Synthesizer};
pub use vad::{VadState, VoiceActivityDetector};
