//! Grounded LLM client library for the deep-report workspace
//!
//! Provides a provider-neutral request/response shape with optional web-search
//! grounding, and implementations for:
//! - Gemini API (Google Search grounding)
//! - Mock (tests)

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::{Config, ModelPreset, ProviderConfig};
pub use error::{LlmError, Result};
pub use provider::{GroundingSource, LlmProvider, LlmRequest, LlmResponse, TokenUsage};
pub use providers::{GeminiProvider, MockProvider, ProviderKind, get_provider};
