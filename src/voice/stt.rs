//! Speech-to-text (STT) adapter
//!
//! Uploads a recorded clip to the Groq-hosted Whisper transcription endpoint
//! and returns the trimmed transcript. An empty transcript is the caller's
//! signal that the clip carried no usable speech.

use crate::llm::GROQ_API_BASE;
use crate::{Error, Result};

/// Default transcription model
pub const DEFAULT_STT_MODEL: &str = "whisper-large-v3";

/// Response from the Whisper transcription API
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes speech to text
pub struct Transcriber {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Transcriber {
    /// Create a new transcriber
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Groq API key required for transcription".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: GROQ_API_BASE.to_string(),
        })
    }

    /// Override the API base URL (tests point this at a mock server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Transcribe a recorded audio clip
    ///
    /// # Arguments
    ///
    /// * `audio` - encoded audio bytes (WAV)
    /// * `file_name` - upload file name hint, e.g. `audio.wav`
    ///
    /// # Errors
    ///
    /// Returns error if the upload or the upstream call fails
    pub async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio)
                    .file_name(file_name.to_string())
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let url = format!("{}/audio/transcriptions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!("transcription API error {status}: {body}")));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            e
        })?;

        let transcript = result.text.trim().to_string();
        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}
