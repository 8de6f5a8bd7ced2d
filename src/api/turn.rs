//! Turn orchestration endpoint
//!
//! One POST route drives the whole pipeline: resolve the input to a
//! transcript, run the chat completion with the fixed tool schema, then
//! either surface the chosen tool call in a header (empty body) or stream
//! synthesized speech back as raw PCM. Every external-call failure is
//! terminal for the turn; nothing is retried and no partial audio is sent.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use uuid::Uuid;

use super::ApiState;
use crate::llm::ChatMessage;
use crate::message::Message;
use crate::tools;

/// Header carrying the percent-encoded transcript
pub const TRANSCRIPT_HEADER: &str = "X-Transcript";

/// Header carrying the percent-encoded reply text
pub const RESPONSE_HEADER: &str = "X-Response";

/// Header carrying the percent-encoded tool invocation descriptor
pub const TOOL_CALL_HEADER: &str = "X-Tool-Call";

/// Build the turn router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/turn", post(turn)).with_state(state)
}

/// The resolved `input` form field
enum TurnInput {
    Text(String),
    Audio { bytes: Bytes, file_name: String },
}

/// A validated turn submission
struct TurnSubmission {
    input: TurnInput,
    history: Vec<Message>,
}

/// Turn pipeline errors, mapped onto plain-text HTTP responses
#[derive(Debug)]
pub enum TurnError {
    /// Schema validation failed on the incoming form
    Malformed,
    /// Transcription failed or produced no usable text
    UnusableAudio,
    /// Upstream chat completion call failed
    CompletionFailed,
    /// The model returned neither text nor a tool call
    EmptyCompletion,
    /// Upstream synthesis call failed
    SynthesisFailed,
}

impl IntoResponse for TurnError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Malformed => (StatusCode::BAD_REQUEST, "Invalid request"),
            Self::UnusableAudio => (StatusCode::BAD_REQUEST, "Invalid audio"),
            Self::CompletionFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Chat completion failed")
            }
            Self::EmptyCompletion => (StatusCode::INTERNAL_SERVER_ERROR, "Invalid response"),
            Self::SynthesisFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Voice synthesis failed")
            }
        };

        (status, message).into_response()
    }
}

/// Handle one conversation turn
async fn turn(
    State(state): State<Arc<ApiState>>,
    multipart: Multipart,
) -> Result<Response, TurnError> {
    let request_id = Uuid::new_v4();
    let submission = parse_submission(multipart).await?;

    // 1. Resolve the input to a transcript
    let started = Instant::now();
    let transcript = match submission.input {
        TurnInput::Text(text) => text.trim().to_string(),
        TurnInput::Audio { bytes, file_name } => state
            .transcriber
            .transcribe(bytes.to_vec(), &file_name)
            .await
            .map_err(|e| {
                tracing::warn!(%request_id, error = %e, "transcription failed");
                TurnError::UnusableAudio
            })?,
    };
    if transcript.is_empty() {
        tracing::warn!(%request_id, "no usable transcript");
        return Err(TurnError::UnusableAudio);
    }
    tracing::debug!(
        %request_id,
        elapsed_ms = elapsed_ms(started),
        transcript = %transcript,
        "transcript resolved"
    );

    // 2. Chat completion over replayed history plus the new user turn
    let mut messages = Vec::with_capacity(submission.history.len() + 2);
    messages.push(ChatMessage::system(state.system_prompt.clone()));
    messages.extend(submission.history.iter().map(ChatMessage::from));
    messages.push(ChatMessage::user(transcript.clone()));

    let started = Instant::now();
    let completion = state
        .chat
        .complete(&messages, &state.tool_definitions)
        .await
        .map_err(|e| {
            tracing::error!(%request_id, error = %e, "chat completion failed");
            TurnError::CompletionFailed
        })?;
    tracing::debug!(
        %request_id,
        elapsed_ms = elapsed_ms(started),
        tool_calls = completion.tool_calls.len(),
        "completion finished"
    );

    let reply = strip_emphasis(&completion.text);

    if reply.is_empty() && completion.tool_calls.is_empty() {
        tracing::error!(%request_id, "completion carried neither text nor a tool call");
        return Err(TurnError::EmptyCompletion);
    }

    // 3. Tool branch: surface the single honored call, skip synthesis
    if let Some((action, call)) = tools::first_action(&completion.tool_calls) {
        let descriptor = serde_json::to_string(call).map_err(|e| {
            tracing::error!(%request_id, error = %e, "tool descriptor serialization failed");
            TurnError::CompletionFailed
        })?;
        tracing::info!(%request_id, tool = action.name(), "tool call surfaced to client");

        let reply = if reply.is_empty() {
            action.placeholder_reply().to_string()
        } else {
            reply
        };

        return Response::builder()
            .status(StatusCode::OK)
            .header(TRANSCRIPT_HEADER, encoded_header(&transcript))
            .header(RESPONSE_HEADER, encoded_header(&reply))
            .header(TOOL_CALL_HEADER, encoded_header(&descriptor))
            .body(Body::empty())
            .map_err(|_| TurnError::CompletionFailed);
    }

    // 4. Synthesis path needs non-empty reply text
    if reply.is_empty() {
        tracing::error!(%request_id, "empty reply text after markup stripping");
        return Err(TurnError::EmptyCompletion);
    }

    let started = Instant::now();
    let speech = state.synthesizer.synthesize(&reply).await.map_err(|e| {
        tracing::error!(%request_id, error = %e, "speech synthesis failed");
        TurnError::SynthesisFailed
    })?;
    tracing::debug!(
        %request_id,
        elapsed_ms = elapsed_ms(started),
        "synthesis stream opened"
    );

    // 5. Stream the audio back verbatim with the transcript side-channel
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(TRANSCRIPT_HEADER, encoded_header(&transcript))
        .header(RESPONSE_HEADER, encoded_header(&reply))
        .body(Body::from_stream(speech.into_stream()))
        .map_err(|_| TurnError::SynthesisFailed)
}

/// Parse and validate the multipart submission
///
/// Unknown fields (e.g. a screen-capture attachment from the other deployment
/// variant) are accepted and ignored.
async fn parse_submission(mut multipart: Multipart) -> Result<TurnSubmission, TurnError> {
    let mut input = None;
    let mut history = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!(error = %e, "malformed multipart body");
        TurnError::Malformed
    })? {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };

        match name.as_str() {
            "input" => {
                let is_audio = field.file_name().is_some()
                    || field
                        .content_type()
                        .is_some_and(|ct| ct.starts_with("audio/"));

                if is_audio {
                    let file_name = field
                        .file_name()
                        .unwrap_or("audio.wav")
                        .to_string();
                    let bytes = field.bytes().await.map_err(|_| TurnError::Malformed)?;
                    input = Some(TurnInput::Audio { bytes, file_name });
                } else {
                    let text = field.text().await.map_err(|_| TurnError::Malformed)?;
                    input = Some(TurnInput::Text(text));
                }
            }
            "message" => {
                let raw = field.text().await.map_err(|_| TurnError::Malformed)?;
                let message: Message = serde_json::from_str(&raw).map_err(|e| {
                    tracing::warn!(error = %e, "invalid history message");
                    TurnError::Malformed
                })?;
                history.push(message);
            }
            other => {
                tracing::debug!(field = other, "ignoring unrecognized form field");
            }
        }
    }

    let input = input.ok_or(TurnError::Malformed)?;
    Ok(TurnSubmission { input, history })
}

/// Strip emphasis markers the model sometimes emits so they are never spoken
fn strip_emphasis(text: &str) -> String {
    text.replace('*', "")
}

/// Percent-encode a header value (the client decodes symmetrically)
fn encoded_header(value: &str) -> HeaderValue {
    HeaderValue::from_str(urlencoding::encode(value).as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emphasis_markers_are_stripped() {
        assert_eq!(strip_emphasis("**bold** and *starred*"), "bold and starred");
        assert_eq!(strip_emphasis("plain"), "plain");
        assert_eq!(strip_emphasis("***"), "");
    }

    #[test]
    fn header_values_are_percent_encoded() {
        let value = encoded_header("two words & more");
        assert_eq!(value.to_str().unwrap(), "two%20words%20%26%20more");
    }

    #[test]
    fn unicode_survives_header_encoding() {
        let value = encoded_header("café ünïcode");
        // Percent-encoded output is pure ASCII, decodable by the client
        assert!(value.to_str().unwrap().is_ascii());
        let decoded = urlencoding::decode(value.to_str().unwrap()).unwrap();
        assert_eq!(decoded, "café ünïcode");
    }
}
