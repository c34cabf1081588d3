//! Speech provider implementations

pub mod mock;
mod openai;

pub use mock::MockSpeechProvider;
pub use openai::{DEFAULT_BASE_URL, OpenAiSpeechProvider};

use crate::error::{Result, TtsError};
use crate::provider::SpeechProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" | "open-ai" | "open_ai" => Ok(Self::OpenAi),
            _ => Err(TtsError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
        }
    }
}

/// Create a provider instance by name.
///
/// `api_key` takes precedence over the provider's environment variable.
pub fn get_provider(
    provider: &str,
    api_key: Option<&str>,
    base_url: Option<&str>,
) -> Result<Box<dyn SpeechProvider>> {
    let kind = ProviderKind::from_str(provider)?;
    let api_key = get_api_key(api_key, kind.env_var(), kind.display_name())?;

    match kind {
        ProviderKind::OpenAi => Ok(Box::new(match base_url {
            Some(url) => OpenAiSpeechProvider::with_base_url(url, api_key),
            None => OpenAiSpeechProvider::new(api_key),
        })),
    }
}

/// Get API key from config or environment variable
fn get_api_key(configured: Option<&str>, env_var: &str, provider_name: &str) -> Result<String> {
    // Check config first
    if let Some(key) = configured.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }

    // Fall back to environment variable
    std::env::var(env_var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| TtsError::MissingApiKey {
            provider: provider_name.to_string(),
            env_var: env_var.to_string(),
        })
}
