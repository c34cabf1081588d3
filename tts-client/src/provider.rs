use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Maximum input size accepted by the OpenAI speech endpoint.
pub const MAX_INPUT_CHARS: usize = 4096;

/// Encoding of the returned audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Opus,
    Aac,
    Flac,
    Wav,
}

impl AudioFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }
}

/// Request to synthesize one piece of text
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub model: String,
    pub voice: String,
    pub input: String,
    pub format: AudioFormat,
}

impl SpeechRequest {
    /// Create an MP3 request
    pub fn new(model: impl Into<String>, voice: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            voice: voice.into(),
            input: input.into(),
            format: AudioFormat::Mp3,
        }
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }
}

/// Trait for speech synthesis providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize the request and return the encoded audio bytes verbatim
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;
}
