//! HTTP API server for Herald gateway

pub mod health;
pub mod rate_limit;
pub mod turn;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::llm::ChatClient;
use crate::tools::{self, ToolDefinition};
use crate::voice::{Synthesizer, Transcriber};
use crate::{Error, Result};

/// Shared state for API handlers
pub struct ApiState {
    /// Speech-to-text adapter
    pub transcriber: Transcriber,

    /// Chat completion adapter
    pub chat: ChatClient,

    /// Speech synthesis adapter
    pub synthesizer: Synthesizer,

    /// Fixed advocate system prompt
    pub system_prompt: String,

    /// The fixed two-item tool schema offered on every completion
    pub tool_definitions: Vec<ToolDefinition>,

    /// Optional global rate limiter
    pub rate_limiter: Option<rate_limit::SharedLimiter>,
}

impl ApiState {
    /// Assemble handler state from configuration
    ///
    /// # Errors
    ///
    /// Returns error if a required API key is missing
    pub fn from_config(config: &Config) -> Result<Self> {
        let groq_key = config
            .api_keys
            .groq
            .clone()
            .ok_or_else(|| Error::Config("GROQ_API_KEY is required to serve".to_string()))?;
        let cartesia_key = config
            .api_keys
            .cartesia
            .clone()
            .ok_or_else(|| Error::Config("CARTESIA_API_KEY is required to serve".to_string()))?;

        let transcriber = Transcriber::new(groq_key.clone(), config.voice.stt_model.clone())?
            .with_base_url(config.upstream.groq_url.clone());

        let chat = ChatClient::new(groq_key, config.llm.model.clone(), config.llm.max_tokens)?
            .with_base_url(config.upstream.groq_url.clone());

        let synthesizer = Synthesizer::new(
            cartesia_key,
            config.voice.tts_model.clone(),
            config.voice.tts_voice.clone(),
            config.voice.tts_sample_rate,
        )?
        .with_base_url(config.upstream.cartesia_url.clone());

        Ok(Self {
            transcriber,
            chat,
            synthesizer,
            system_prompt: config.advocate.system_prompt(),
            tool_definitions: tools::definitions(),
            rate_limiter: config
                .server
                .rate_limit_per_minute
                .map(rate_limit::create_limiter),
        })
    }
}

/// Build the router with all routes and middleware
pub fn router(state: Arc<ApiState>) -> Router {
    let router = Router::new()
        .nest("/api", turn::router(state.clone()))
        .merge(health::router())
        .layer(axum::middleware::from_fn_with_state(
            state,
            rate_limit::rate_limit_middleware,
        ));

    // Browser clients read the side-channel headers cross-origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Build a server from configuration
    ///
    /// # Errors
    ///
    /// Returns error if a required API key is missing
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            state: Arc::new(ApiState::from_config(config)?),
            port: config.server.port,
        })
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}
