//! LLM provider implementations

mod gemini;
pub mod mock;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;

use crate::config::{ModelPreset, ProviderConfig};
use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" | "google-gemini" => Ok(Self::Gemini),
            _ => Err(LlmError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Environment variables checked, in order, for this provider's API key
    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            Self::Gemini => &["GEMINI_API_KEY", "API_KEY"],
        }
    }

    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
        }
    }
}

/// Create a provider instance from a preset and optional config
pub fn get_provider(
    preset: &ModelPreset,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn LlmProvider>> {
    let kind = ProviderKind::parse(&preset.provider)?;
    let api_key = get_api_key(provider_config, kind)?;
    let base_url = provider_config.and_then(|c| c.base_url.as_deref());

    match kind {
        ProviderKind::Gemini => {
            let provider = match base_url {
                Some(url) => GeminiProvider::with_base_url(&preset.model, url, api_key)?,
                None => GeminiProvider::new(&preset.model, api_key)?,
            };
            Ok(Box::new(provider))
        }
    }
}

/// Get API key from config or environment variables
fn get_api_key(config: Option<&ProviderConfig>, kind: ProviderKind) -> Result<String> {
    // Check config first
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Ok(key);
    }

    kind.env_vars()
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| LlmError::MissingApiKey {
            provider: kind.display_name().to_string(),
            env_var: kind.env_vars()[0].to_string(),
        })
}
