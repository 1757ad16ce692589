//! Mock LLM provider for testing
//!
//! Returns a canned grounded answer or a canned failure and counts calls,
//! so callers can be tested without network access.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{LlmError, Result};
use crate::provider::{GroundingSource, LlmProvider, LlmRequest, LlmResponse};

/// A mock provider with a fixed outcome
pub struct MockProvider {
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return (None = always succeed)
    fail_with: Option<LlmError>,
    /// Response content to return on success
    success_response: String,
    /// Sources to return on success
    sources: Vec<GroundingSource>,
    /// Last request received, for assertions on prompt construction
    last_request: Mutex<Option<LlmRequest>>,
}

impl MockProvider {
    /// Create a provider that always fails with the given error
    pub fn always_fails(error: LlmError) -> Self {
        Self {
            call_count: AtomicUsize::new(0),
            fail_with: Some(error),
            success_response: String::new(),
            sources: Vec::new(),
            last_request: Mutex::new(None),
        }
    }

    /// Create a provider that always succeeds
    pub fn always_succeeds(response: &str) -> Self {
        Self {
            call_count: AtomicUsize::new(0),
            fail_with: None,
            success_response: response.to_string(),
            sources: Vec::new(),
            last_request: Mutex::new(None),
        }
    }

    /// Attach grounding sources to successful responses
    pub fn with_sources(mut self, sources: Vec<GroundingSource>) -> Self {
        self.sources = sources;
        self
    }

    /// Get the number of times complete() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get a copy of the last request passed to complete()
    pub fn last_request(&self) -> Option<LlmRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request);

        if let Some(err) = &self.fail_with {
            return Err(clone_error(err));
        }

        Ok(LlmResponse {
            content: self.success_response.clone(),
            model: "mock-model".to_string(),
            sources: self.sources.clone(),
            usage: None,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone an LlmError (needed because LlmError doesn't implement Clone)
fn clone_error(err: &LlmError) -> LlmError {
    match err {
        LlmError::ServerOverloaded { message } => LlmError::ServerOverloaded {
            message: message.clone(),
        },
        LlmError::MissingApiKey { provider, env_var } => LlmError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        LlmError::RateLimited { retry_after } => LlmError::RateLimited {
            retry_after: *retry_after,
        },
        LlmError::ApiError {
            message,
            status_code,
        } => LlmError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        LlmError::ProviderUnavailable(s) => LlmError::ProviderUnavailable(s.clone()),
        LlmError::ConfigError(s) => LlmError::ConfigError(s.clone()),
        LlmError::InvalidPreset(s) => LlmError::InvalidPreset(s.clone()),
        // Io and Toml errors can't be cloned
        LlmError::Io(_) => LlmError::ConfigError("IO error (mock)".to_string()),
        LlmError::TomlParse(_) => LlmError::ConfigError("TOML parse error (mock)".to_string()),
        LlmError::TomlSerialize(_) => {
            LlmError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_succeeds_with_sources() {
        let provider = MockProvider::always_succeeds("report").with_sources(vec![
            GroundingSource::new("https://example.com", Some("Example".into())),
        ]);

        let response = provider
            .complete(LlmRequest::new("topic").with_web_search())
            .await
            .unwrap();
        assert_eq!(response.content, "report");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(provider.call_count(), 1);
        assert!(provider.last_request().unwrap().web_search);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let provider = MockProvider::always_fails(LlmError::ServerOverloaded {
            message: "overloaded".to_string(),
        });

        for _ in 0..3 {
            let result = provider.complete(LlmRequest::new("test")).await;
            assert!(matches!(result, Err(LlmError::ServerOverloaded { .. })));
        }
        assert_eq!(provider.call_count(), 3);
    }
}
