//! Herald Gateway - a voice assistant that advocates for a candidate
//!
//! This library provides the full demo pipeline:
//! - The gateway server: one turn-orchestration endpoint sequencing
//!   transcription, chat completion (with two fixed tool actions), and
//!   speech synthesis
//! - The client session: microphone capture, utterance segmentation,
//!   single-flight turn submission, and playback with barge-in
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 Client Session                        │
//! │   Capture  │  VAD  │  Playback  │  History  │  Links │
//! └────────────────────┬─────────────────────────────────┘
//!                      │ multipart turn / header side-channel
//! ┌────────────────────▼─────────────────────────────────┐
//! │                Herald Gateway                         │
//! │   Orchestrator  │  Tool dispatch  │  Rate limit      │
//! └────────────────────┬─────────────────────────────────┘
//!                      │
//! ┌────────────────────▼─────────────────────────────────┐
//! │              Hosted services                          │
//! │   Whisper STT  │  Chat LLM  │  Sonic TTS             │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod message;
pub mod persona;
pub mod session;
pub mod tools;
pub mod voice;

pub use config::Config;
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use persona::Advocate;
pub use session::SessionController;
pub use tools::ToolAction;
