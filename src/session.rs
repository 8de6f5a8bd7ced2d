//! Client session controller
//!
//! Owns the conversation history and drives the voice loop: capture →
//! segment → submit → interpret headers → play or navigate. Exactly one
//! submission is in flight at a time; a new utterance preempts any reply
//! still playing (barge-in). A failed turn leaves the history untouched.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::turn::{RESPONSE_HEADER, TOOL_CALL_HEADER, TRANSCRIPT_HEADER};
use crate::config::Config;
use crate::llm::ToolCall;
use crate::message::Message;
use crate::persona::Advocate;
use crate::tools::ToolAction;
use crate::voice::{
    pcm_f32le_to_samples, samples_to_wav, AudioCapture, AudioPlayback, PlaybackHandle,
    VoiceActivityDetector, SAMPLE_RATE,
};
use crate::{Error, Result};

/// How often the session loop drains the capture buffer
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What the server told us about one completed turn
struct TurnOutcome {
    transcript: String,
    reply: String,
    action: Option<ToolAction>,
    audio: Option<Vec<u8>>,
    latency_ms: u64,
}

/// The turn input, mirroring the server's `input` field
enum TurnInput {
    Text(String),
    Audio(Vec<u8>),
}

/// Interactive client session against a Herald server
pub struct SessionController {
    client: reqwest::Client,
    server_url: String,
    advocate: Advocate,
    half_duplex: bool,
    tts_sample_rate: u32,
    history: Vec<Message>,
}

impl SessionController {
    /// Create a session controller from configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            server_url: config.server.url.trim_end_matches('/').to_string(),
            advocate: config.advocate.clone(),
            half_duplex: config.voice.half_duplex,
            tts_sample_rate: config.voice.tts_sample_rate,
            history: Vec::new(),
        }
    }

    /// Conversation history accumulated so far
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Submit a single text turn and return the reply text
    ///
    /// # Errors
    ///
    /// Returns error if the turn fails; history is unchanged in that case
    pub async fn ask(&mut self, text: &str) -> Result<String> {
        let outcome = self.submit(TurnInput::Text(text.to_string())).await?;
        let reply = outcome.reply.clone();
        self.record(outcome);
        Ok(reply)
    }

    /// Run the interactive voice session until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if audio devices cannot be opened
    pub async fn run(mut self) -> Result<()> {
        let mut capture = AudioCapture::new()?;
        let mut vad = VoiceActivityDetector::new();
        let playback = Arc::new(AudioPlayback::new(self.tts_sample_rate)?);
        let mut playing: Option<(PlaybackHandle, tokio::task::JoinHandle<()>)> = None;

        capture.start()?;
        println!("Listening - just start talking. Press Ctrl-C to exit.");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("session interrupted");
                    break;
                }
                () = tokio::time::sleep(POLL_INTERVAL) => {
                    let samples = capture.take_buffer();
                    if samples.is_empty() {
                        continue;
                    }
                    let Some(utterance) = vad.push(&samples) else {
                        continue;
                    };

                    // Barge-in: a new utterance interrupts the playing reply
                    if let Some((handle, task)) = playing.take() {
                        handle.stop();
                        let _ = task.await;
                    }

                    let wav = match samples_to_wav(&utterance, SAMPLE_RATE) {
                        Ok(wav) => wav,
                        Err(e) => {
                            notify(&format!("could not encode audio: {e}"));
                            continue;
                        }
                    };

                    match self.submit(TurnInput::Audio(wav)).await {
                        Ok(outcome) => {
                            println!("you: {}", outcome.transcript);
                            println!("assistant: {} ({}ms)", outcome.reply, outcome.latency_ms);

                            let action = outcome.action;
                            let audio = outcome.audio.clone();
                            self.record(outcome);

                            if let Some(action) = action {
                                self.navigate(action);
                            } else if let Some(audio) = audio {
                                self.play_reply(
                                    audio,
                                    &playback,
                                    &capture,
                                    &mut vad,
                                    &mut playing,
                                )
                                .await;
                            }
                        }
                        // Failed turn: notify and drop it, history unchanged
                        Err(e) => notify(&e.to_string()),
                    }
                }
            }
        }

        if let Some((handle, task)) = playing.take() {
            handle.stop();
            let _ = task.await;
        }
        capture.stop();
        Ok(())
    }

    /// Submit one turn to the server and interpret the header side-channel
    async fn submit(&self, input: TurnInput) -> Result<TurnOutcome> {
        let mut form = match input {
            TurnInput::Text(text) => reqwest::multipart::Form::new().text("input", text),
            TurnInput::Audio(wav) => reqwest::multipart::Form::new().part(
                "input",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Session(e.to_string()))?,
            ),
        };
        for message in &self.history {
            form = form.text("message", serde_json::to_string(message)?);
        }

        let submitted_at = Instant::now();
        let response = self
            .client
            .post(format!("{}/api/turn", self.server_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let transcript = decoded_header(&response, TRANSCRIPT_HEADER);
        let reply = decoded_header(&response, RESPONSE_HEADER);
        let tool_call = decoded_header(&response, TOOL_CALL_HEADER);

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::Session(
                "too many requests, please try again later".to_string(),
            ));
        }

        // A success response without the required headers is a failed turn
        if !status.is_success() || transcript.is_empty() || (reply.is_empty() && tool_call.is_empty())
        {
            let body = response.text().await.unwrap_or_default();
            let detail = if body.is_empty() {
                format!("turn failed with status {status}")
            } else {
                body
            };
            return Err(Error::Session(detail));
        }

        let latency_ms = u64::try_from(submitted_at.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !tool_call.is_empty() {
            let call: ToolCall = serde_json::from_str(&tool_call)
                .map_err(|e| Error::Session(format!("undecodable tool descriptor: {e}")))?;
            let action = ToolAction::from_name(&call.function.name).ok_or_else(|| {
                Error::Session(format!("unknown tool action: {}", call.function.name))
            })?;

            let reply = if reply.is_empty() {
                action.placeholder_reply().to_string()
            } else {
                reply
            };

            return Ok(TurnOutcome {
                transcript,
                reply,
                action: Some(action),
                audio: None,
                latency_ms,
            });
        }

        let audio = response.bytes().await?.to_vec();
        Ok(TurnOutcome {
            transcript,
            reply,
            action: None,
            audio: Some(audio),
            latency_ms,
        })
    }

    /// Append the completed turn to history
    fn record(&mut self, outcome: TurnOutcome) {
        self.history.push(Message::user(outcome.transcript));
        let mut assistant = Message::assistant(outcome.reply);
        assistant.latency = Some(outcome.latency_ms);
        self.history.push(assistant);
    }

    /// Perform the fixed external navigation for a tool action
    fn navigate(&self, action: ToolAction) {
        let url = action.url(&self.advocate);
        tracing::info!(tool = action.name(), url = %url, "opening link");
        if let Err(e) = webbrowser::open(url) {
            notify(&format!("could not open {url}: {e}"));
        }
    }

    /// Play a synthesized reply, respecting the half-duplex workaround
    async fn play_reply(
        &self,
        audio: Vec<u8>,
        playback: &Arc<AudioPlayback>,
        capture: &AudioCapture,
        vad: &mut VoiceActivityDetector,
        playing: &mut Option<(PlaybackHandle, tokio::task::JoinHandle<()>)>,
    ) {
        let samples = pcm_f32le_to_samples(&audio);
        let handle = PlaybackHandle::new();

        if self.half_duplex {
            // Mute the microphone for the duration so the reply does not
            // re-trigger detection (platform quirk workaround)
            capture.set_muted(true);
            let pb = Arc::clone(playback);
            let h = handle.clone();
            let result = tokio::task::spawn_blocking(move || pb.play(samples, &h)).await;
            if let Ok(Err(e)) = result {
                notify(&format!("playback failed: {e}"));
            }
            capture.set_muted(false);
            capture.clear_buffer();
            vad.reset();
        } else {
            let pb = Arc::clone(playback);
            let h = handle.clone();
            let task = tokio::task::spawn_blocking(move || {
                if let Err(e) = pb.play(samples, &h) {
                    tracing::error!(error = %e, "playback failed");
                }
            });
            *playing = Some((handle, task));
        }
    }
}

/// Read and percent-decode a response header, empty when absent
fn decoded_header(response: &reqwest::Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            urlencoding::decode(v)
                .map(Cow::into_owned)
                .unwrap_or_default()
        })
        .unwrap_or_default()
}

/// Transient user-visible notification
fn notify(message: &str) {
    println!("[notice] {message}");
    tracing::warn!(notice = %message, "session notice");
}
