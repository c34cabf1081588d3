//! Mock speech provider for testing
//!
//! Provides a configurable mock provider that can simulate failures on
//! particular calls or inputs and records every request it receives.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, TtsError};
use crate::provider::{SpeechProvider, SpeechRequest};

/// A mock provider for testing synthesis loops
pub struct MockSpeechProvider {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<TtsError>>,
    /// Fail any request whose input contains this text
    fail_on_input: Option<String>,
    /// Audio bytes returned on success
    audio: Vec<u8>,
    /// Every request seen, in call order
    requests: Mutex<Vec<SpeechRequest>>,
    /// Provider name for display
    name: &'static str,
}

impl MockSpeechProvider {
    fn build(fail_count: usize, error: Option<TtsError>, audio: &[u8]) -> Self {
        Self {
            fail_count: AtomicUsize::new(fail_count),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(error),
            fail_on_input: None,
            audio: audio.to_vec(),
            requests: Mutex::new(Vec::new()),
            name: "mock",
        }
    }

    /// Create a provider that always returns `audio`
    pub fn always_succeeds(audio: &[u8]) -> Self {
        Self::build(0, None, audio)
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: TtsError) -> Self {
        Self::build(usize::MAX, Some(error), &[])
    }

    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: TtsError, audio: &[u8]) -> Self {
        Self::build(n, Some(error), audio)
    }

    /// Create a provider that fails only for inputs containing `needle`
    pub fn fails_when_input_contains(needle: &str, error: TtsError, audio: &[u8]) -> Self {
        let mut provider = Self::build(0, Some(error), audio);
        provider.fail_on_input = Some(needle.to_string());
        provider
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Set a custom provider name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    fn error(&self) -> Option<TtsError> {
        self.fail_with.lock().unwrap().as_ref().map(clone_error)
    }
}

#[async_trait]
impl SpeechProvider for MockSpeechProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let fails_by_input = self
            .fail_on_input
            .as_deref()
            .is_some_and(|needle| request.input.contains(needle));
        let fails_by_count =
            self.fail_on_input.is_none() && call_num < self.fail_count.load(Ordering::SeqCst);

        if fails_by_input || fails_by_count {
            if let Some(err) = self.error() {
                return Err(err);
            }
        }

        Ok(self.audio.clone())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Clone a TtsError (needed because TtsError doesn't implement Clone)
fn clone_error(err: &TtsError) -> TtsError {
    match err {
        TtsError::MissingApiKey { provider, env_var } => TtsError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        TtsError::RateLimited { retry_after } => TtsError::RateLimited {
            retry_after: *retry_after,
        },
        TtsError::ServerOverloaded { message } => TtsError::ServerOverloaded {
            message: message.clone(),
        },
        TtsError::ApiError {
            message,
            status_code,
        } => TtsError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        TtsError::InputTooLong { len, limit } => TtsError::InputTooLong {
            len: *len,
            limit: *limit,
        },
        TtsError::EmptyInput => TtsError::EmptyInput,
        TtsError::ConfigError(s) => TtsError::ConfigError(s.clone()),
        // Io errors can't be cloned
        TtsError::Io(e) => TtsError::ConfigError(format!("IO error (mock): {}", e)),
    }
}
