//! Configuration management for Herald gateway
//!
//! Layering, lowest to highest precedence: built-in defaults, the optional
//! TOML file, then environment variables. Credentials only ever come from the
//! file or the environment.

pub mod file;

use std::path::{Path, PathBuf};

use crate::persona::Advocate;
use crate::{llm, voice, Error, Result};

/// Default API server port
pub const DEFAULT_PORT: u16 = 18790;

/// Herald gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Candidate profile the assistant advocates for
    pub advocate: Advocate,

    /// LLM configuration
    pub llm: LlmConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Server configuration
    pub server: ServerConfig,

    /// Upstream service base URLs
    pub upstream: UpstreamConfig,
}

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Chat model identifier
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: u32,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT model identifier
    pub stt_model: String,

    /// TTS model identifier
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS output sample rate in Hz
    pub tts_sample_rate: u32,

    /// Pause capture while playback runs (feedback workaround)
    pub half_duplex: bool,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Groq API key (Whisper transcription + chat completions)
    pub groq: Option<String>,

    /// Cartesia API key (speech synthesis)
    pub cartesia: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Requests-per-minute quota; `None` disables rate limiting
    pub rate_limit_per_minute: Option<u32>,

    /// Server URL the `talk` client submits turns to
    pub url: String,
}

/// Upstream service base URLs
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Groq OpenAI-compatible base (STT + chat)
    pub groq_url: String,

    /// Cartesia base (TTS)
    pub cartesia_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            advocate: Advocate::default(),
            llm: LlmConfig {
                model: llm::DEFAULT_CHAT_MODEL.to_string(),
                max_tokens: 1024,
            },
            voice: VoiceConfig {
                stt_model: voice::stt::DEFAULT_STT_MODEL.to_string(),
                tts_model: voice::tts::DEFAULT_TTS_MODEL.to_string(),
                tts_voice: voice::tts::DEFAULT_TTS_VOICE.to_string(),
                tts_sample_rate: voice::tts::DEFAULT_TTS_SAMPLE_RATE,
                half_duplex: true,
            },
            api_keys: ApiKeys::default(),
            server: ServerConfig {
                port: DEFAULT_PORT,
                rate_limit_per_minute: None,
                url: format!("http://127.0.0.1:{DEFAULT_PORT}"),
            },
            upstream: UpstreamConfig {
                groq_url: llm::GROQ_API_BASE.to_string(),
                cartesia_url: voice::tts::CARTESIA_API_BASE.to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from defaults, the config file, and the environment
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be parsed, or if the
    /// advocate URLs are invalid
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let path = config_path.map_or_else(Self::default_config_path, |p| Some(p.to_path_buf()));
        if let Some(path) = path {
            if path.exists() {
                let content = std::fs::read_to_string(&path)?;
                let overlay: file::HeraldConfigFile = toml::from_str(&content)?;
                config.apply_file(overlay);
                tracing::debug!(path = %path.display(), "loaded config file");
            } else if config_path.is_some() {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Default config file location (`~/.config/herald/config.toml`)
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "herald")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the TOML file
    fn apply_file(&mut self, overlay: file::HeraldConfigFile) {
        if let Some(advocate) = overlay.advocate {
            self.advocate = advocate;
        }

        if let Some(model) = overlay.llm.model {
            self.llm.model = model;
        }
        if let Some(max_tokens) = overlay.llm.max_tokens {
            self.llm.max_tokens = max_tokens;
        }

        if let Some(stt_model) = overlay.voice.stt_model {
            self.voice.stt_model = stt_model;
        }
        if let Some(tts_model) = overlay.voice.tts_model {
            self.voice.tts_model = tts_model;
        }
        if let Some(tts_voice) = overlay.voice.tts_voice {
            self.voice.tts_voice = tts_voice;
        }
        if let Some(rate) = overlay.voice.tts_sample_rate {
            self.voice.tts_sample_rate = rate;
        }
        if let Some(half_duplex) = overlay.voice.half_duplex {
            self.voice.half_duplex = half_duplex;
        }

        if overlay.api_keys.groq.is_some() {
            self.api_keys.groq = overlay.api_keys.groq;
        }
        if overlay.api_keys.cartesia.is_some() {
            self.api_keys.cartesia = overlay.api_keys.cartesia;
        }

        if let Some(port) = overlay.server.port {
            self.server.port = port;
            self.server.url = format!("http://127.0.0.1:{port}");
        }
        if overlay.server.rate_limit_per_minute.is_some() {
            self.server.rate_limit_per_minute = overlay.server.rate_limit_per_minute;
        }
        if let Some(url) = overlay.server.url {
            self.server.url = url;
        }

        if let Some(url) = overlay.upstream.groq_url {
            self.upstream.groq_url = url;
        }
        if let Some(url) = overlay.upstream.cartesia_url {
            self.upstream.cartesia_url = url;
        }
    }

    /// Apply environment variable overrides
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            if !key.is_empty() {
                self.api_keys.groq = Some(key);
            }
        }
        if let Ok(key) = std::env::var("CARTESIA_API_KEY") {
            if !key.is_empty() {
                self.api_keys.cartesia = Some(key);
            }
        }
        if let Ok(port) = std::env::var("HERALD_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
                self.server.url = format!("http://127.0.0.1:{port}");
            }
        }
        if let Ok(url) = std::env::var("HERALD_SERVER_URL") {
            if !url.is_empty() {
                self.server.url = url;
            }
        }
        if let Ok(url) = std::env::var("HERALD_GROQ_URL") {
            if !url.is_empty() {
                self.upstream.groq_url = url;
            }
        }
        if let Ok(url) = std::env::var("HERALD_CARTESIA_URL") {
            if !url.is_empty() {
                self.upstream.cartesia_url = url;
            }
        }
    }

    /// Validate cross-field constraints
    fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("advocate.profile_url", &self.advocate.profile_url),
            ("advocate.resume_url", &self.advocate.resume_url),
            ("server.url", &self.server.url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::Config(format!("invalid {label} \"{value}\": {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.voice.tts_sample_rate, 24000);
        assert!(config.voice.half_duplex);
    }

    #[test]
    fn file_overlay_wins_over_defaults() {
        let overlay: file::HeraldConfigFile = toml::from_str(
            r#"
            [llm]
            model = "test-model"

            [voice]
            tts_voice = "custom-voice"
            half_duplex = false

            [server]
            port = 9999
            rate_limit_per_minute = 60
            "#,
        )
        .unwrap();

        let mut config = Config::default();
        config.apply_file(overlay);

        assert_eq!(config.llm.model, "test-model");
        assert_eq!(config.voice.tts_voice, "custom-voice");
        assert!(!config.voice.half_duplex);
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.url, "http://127.0.0.1:9999");
        assert_eq!(config.server.rate_limit_per_minute, Some(60));
    }

    #[test]
    fn invalid_advocate_url_is_rejected() {
        let mut config = Config::default();
        config.advocate.resume_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn advocate_section_parses_from_toml() {
        let overlay: file::HeraldConfigFile = toml::from_str(
            r#"
            [advocate]
            candidate = "Alex Kim"
            profile_url = "https://example.com/alex"
            resume_url = "https://example.com/alex.pdf"
            "#,
        )
        .unwrap();

        let mut config = Config::default();
        config.apply_file(overlay);

        assert_eq!(config.advocate.candidate, "Alex Kim");
        assert_eq!(config.advocate.profile_url, "https://example.com/alex");
    }
}
