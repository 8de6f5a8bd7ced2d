//! Text-to-speech (TTS) adapter
//!
//! Wraps the Cartesia `tts/bytes` endpoint. Output is raw PCM (32-bit float
//! little-endian) at a fixed sample rate, returned as a byte stream so the
//! route handler can forward it verbatim without buffering.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;

use crate::{Error, Result};

/// Default Cartesia API base
pub const CARTESIA_API_BASE: &str = "https://api.cartesia.ai";

/// API version header value required by Cartesia
const CARTESIA_VERSION: &str = "2024-06-30";

/// Default synthesis model
pub const DEFAULT_TTS_MODEL: &str = "sonic-english";

/// Default voice identity
pub const DEFAULT_TTS_VOICE: &str = "79a125e8-cd45-4c13-8a67-188112f4dd22";

/// Default output sample rate in Hz
pub const DEFAULT_TTS_SAMPLE_RATE: u32 = 24000;

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    model_id: &'a str,
    transcript: &'a str,
    voice: VoiceSelector<'a>,
    output_format: OutputFormat,
}

#[derive(Serialize)]
struct VoiceSelector<'a> {
    mode: &'static str,
    id: &'a str,
}

#[derive(Serialize)]
struct OutputFormat {
    container: &'static str,
    encoding: &'static str,
    sample_rate: u32,
}

/// Synthesized audio, ready to stream
pub struct SpeechStream {
    response: reqwest::Response,
    sample_rate: u32,
}

impl SpeechStream {
    /// Sample rate of the PCM payload in Hz
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Consume into a byte stream for response forwarding
    pub fn into_stream(self) -> impl Stream<Item = reqwest::Result<Bytes>> {
        self.response.bytes_stream()
    }

    /// Buffer the full payload (used by local playback)
    ///
    /// # Errors
    ///
    /// Returns error if the stream is cut short
    pub async fn collect(self) -> Result<Vec<u8>> {
        let mut stream = self.response.bytes_stream();
        let mut audio = Vec::new();
        while let Some(chunk) = stream.next().await {
            audio.extend_from_slice(&chunk?);
        }
        Ok(audio)
    }
}

/// Synthesizes speech from text
pub struct Synthesizer {
    client: reqwest::Client,
    api_key: String,
    model_id: String,
    voice_id: String,
    sample_rate: u32,
    base_url: String,
}

impl Synthesizer {
    /// Create a new synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(
        api_key: String,
        model_id: String,
        voice_id: String,
        sample_rate: u32,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Cartesia API key required for speech synthesis".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model_id,
            voice_id,
            sample_rate,
            base_url: CARTESIA_API_BASE.to_string(),
        })
    }

    /// Override the API base URL (tests point this at a mock server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Synthesize text to raw PCM audio
    ///
    /// The upstream error body is read and logged on failure; the caller only
    /// sees a generic synthesis error.
    ///
    /// # Errors
    ///
    /// Returns error if the upstream call fails
    pub async fn synthesize(&self, text: &str) -> Result<SpeechStream> {
        let request = SynthesisRequest {
            model_id: &self.model_id,
            transcript: text,
            voice: VoiceSelector { mode: "id", id: &self.voice_id },
            output_format: OutputFormat {
                container: "raw",
                encoding: "pcm_f32le",
                sample_rate: self.sample_rate,
            },
        };

        let url = format!("{}/tts/bytes", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Cartesia-Version", CARTESIA_VERSION)
            .header("X-API-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "speech synthesis request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "speech synthesis API error");
            return Err(Error::Tts(format!("synthesis API error {status}")));
        }

        Ok(SpeechStream { response, sample_rate: self.sample_rate })
    }
}
