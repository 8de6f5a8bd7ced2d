//! Chat completion adapter
//!
//! Wraps the Groq-hosted OpenAI-compatible chat completion API. One call per
//! turn: system prompt, replayed history, latest user transcript, and the
//! fixed two-tool schema. The adapter reports text and tool calls verbatim;
//! deciding what to do with them is the orchestrator's job.

use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};
use crate::tools::ToolDefinition;
use crate::{Error, Result};

/// Default API base for Groq's OpenAI-compatible endpoints
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// A chat message on the completion wire (roles include `system`)
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant", content: content.into() }
    }
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        match msg.role {
            Role::User => Self::user(msg.content.clone()),
            Role::Assistant => Self::assistant(msg.content.clone()),
        }
    }
}

/// A tool invocation returned by the model
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub function: FunctionCall,
}

/// The function portion of a tool invocation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Outcome of one completion call
#[derive(Debug, Clone)]
pub struct Completion {
    /// Assistant text, possibly empty when the model only called a tool
    pub text: String,
    /// Tool invocations, in the order the model requested them
    pub tool_calls: Vec<ToolCall>,
}

impl Completion {
    /// True when the model produced neither text nor a tool call
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tool_calls.is_empty()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: &'a [ToolDefinition],
    tool_choice: &'a str,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

/// Calls the hosted chat completion service
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl ChatClient {
    /// Create a new chat client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Groq API key required for chat completions".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            max_tokens,
            base_url: GROQ_API_BASE.to_string(),
        })
    }

    /// Override the API base URL (tests point this at a mock server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Run one chat completion with the fixed tool schema
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<Completion> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            tools,
            tool_choice: "auto",
            max_tokens: self.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat completion request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat completion API error");
            return Err(Error::Chat(format!("chat API error {status}: {body}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse chat completion response");
            e
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Chat("completion returned no choices".to_string()))?;

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }
}
