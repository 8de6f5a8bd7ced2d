//! TOML configuration file loading
//!
//! Supports `~/.config/herald/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use serde::Deserialize;

use crate::persona::Advocate;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct HeraldConfigFile {
    /// Candidate profile the assistant advocates for
    #[serde(default)]
    pub advocate: Option<Advocate>,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Upstream service base URLs
    #[serde(default)]
    pub upstream: UpstreamFileConfig,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "meta-llama/llama-4-scout-17b-16e-instruct")
    pub model: Option<String>,

    /// Max tokens per completion
    pub max_tokens: Option<u32>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT model (e.g. "whisper-large-v3")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "sonic-english")
    pub tts_model: Option<String>,

    /// TTS voice identifier
    pub tts_voice: Option<String>,

    /// TTS output sample rate in Hz
    pub tts_sample_rate: Option<u32>,

    /// Pause capture while playback runs (feedback workaround)
    pub half_duplex: Option<bool>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub groq: Option<String>,
    pub cartesia: Option<String>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Requests-per-minute quota; absent disables rate limiting
    pub rate_limit_per_minute: Option<u32>,

    /// Server URL the `talk` client submits turns to
    pub url: Option<String>,
}

/// Upstream service base URLs (overridable for tests and proxies)
#[derive(Debug, Default, Deserialize)]
pub struct UpstreamFileConfig {
    /// Groq OpenAI-compatible base (STT + chat)
    pub groq_url: Option<String>,

    /// Cartesia base (TTS)
    pub cartesia_url: Option<String>,
}
