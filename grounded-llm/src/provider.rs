use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Request to send to an LLM provider
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Ask the provider to ground the answer with a web search
    pub web_search: bool,
}

impl LlmRequest {
    /// Create a plain request for the given prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Enable web-search grounding
    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    /// Web pages the answer was grounded on, in the order the provider cited them
    pub sources: Vec<GroundingSource>,
    pub usage: Option<TokenUsage>,
}

/// A cited web reference returned alongside a grounded answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl GroundingSource {
    pub fn new(uri: impl Into<String>, title: Option<String>) -> Self {
        Self {
            uri: uri.into(),
            title,
        }
    }

    /// Title for display, falling back to the uri when the title is missing or blank
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => &self.uri,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a completion request
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Check if the provider is available (API key set, endpoint configured, etc.)
    fn is_available(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_fallback() {
        let titled = GroundingSource::new("https://example.com", Some("Example".into()));
        assert_eq!(titled.display_title(), "Example");

        let blank = GroundingSource::new("https://example.com", Some("  ".into()));
        assert_eq!(blank.display_title(), "https://example.com");

        let untitled = GroundingSource::new("https://example.com", None);
        assert_eq!(untitled.display_title(), "https://example.com");
    }

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::new("topic").with_web_search();
        assert_eq!(request.prompt, "topic");
        assert!(request.web_search);
        assert!(request.system_prompt.is_none());
    }
}
