//! Text-to-speech client library for the pdf-narrator workspace
//!
//! Provides a single interface over speech synthesis services:
//! - OpenAI `/v1/audio/speech` (and API-compatible servers)
//! - An in-memory mock for tests

pub mod error;
pub mod provider;
pub mod providers;

pub use error::{Result, TtsError};
pub use provider::{AudioFormat, SpeechProvider, SpeechRequest};
pub use providers::{MockSpeechProvider, OpenAiSpeechProvider, ProviderKind, get_provider};
