//! OpenAI speech provider
//!
//! Talks to `POST {base_url}/audio/speech`. Any server implementing the same
//! endpoint can be used by overriding the base URL.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TtsError};
use crate::provider::{AudioFormat, MAX_INPUT_CHARS, SpeechProvider, SpeechRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Provider for the OpenAI text-to-speech API
pub struct OpenAiSpeechProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAiSpeechProvider {
    /// Create a provider against the public OpenAI endpoint
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Create a provider against a compatible server
    pub fn with_base_url(base_url: &str, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.base_url)
    }
}

// OpenAI API request/error types

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: AudioFormat,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Reject requests the service would refuse anyway.
fn validate_input(input: &str) -> Result<()> {
    if input.trim().is_empty() {
        return Err(TtsError::EmptyInput);
    }
    let len = input.chars().count();
    if len > MAX_INPUT_CHARS {
        return Err(TtsError::InputTooLong {
            len,
            limit: MAX_INPUT_CHARS,
        });
    }
    Ok(())
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        validate_input(&request.input)?;

        let body = SpeechBody {
            model: &request.model,
            voice: &request.voice,
            input: &request.input,
            response_format: request.format,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            return Err(match status.as_u16() {
                429 => TtsError::RateLimited { retry_after },
                503 => TtsError::ServerOverloaded { message },
                code => TtsError::ApiError {
                    message,
                    status_code: Some(code),
                },
            });
        }

        let bytes = response.bytes().await.map_err(|e| TtsError::ApiError {
            message: format!("Failed to read audio body: {}", e),
            status_code: None,
        })?;

        log::debug!(
            "Received {} bytes of {} audio",
            bytes.len(),
            request.format.extension()
        );

        Ok(bytes.to_vec())
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }
}
