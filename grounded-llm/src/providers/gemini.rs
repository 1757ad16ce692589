//! Gemini API provider
//!
//! Direct HTTP implementation of the `generateContent` REST call, with optional
//! Google Search grounding. Grounded answers carry the web pages they cite.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::provider::{GroundingSource, LlmProvider, LlmRequest, LlmResponse, TokenUsage};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Provider for the Gemini API
pub struct GeminiProvider {
    model: String,
    base_url: String,
    api_key: String,
    client: Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider against the public endpoint
    pub fn new(model: &str, api_key: String) -> Result<Self> {
        Self::with_base_url(model, GEMINI_API_URL, api_key)
    }

    /// Create a provider against a custom endpoint (proxies, tests)
    pub fn with_base_url(model: &str, base_url: &str, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey {
                provider: "Gemini".to_string(),
                env_var: "GEMINI_API_KEY".to_string(),
            });
        }

        Ok(Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

// Gemini API request/response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn build_request(request: &LlmRequest) -> GenerateContentRequest {
    let system_instruction = request.system_prompt.as_ref().map(|system| Content {
        role: None,
        parts: vec![Part {
            text: Some(system.clone()),
        }],
    });

    let tools = if request.web_search {
        vec![Tool {
            google_search: GoogleSearch {},
        }]
    } else {
        Vec::new()
    };

    let generation_config = if request.max_tokens.is_some() || request.temperature.is_some() {
        Some(GenerationConfig {
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
        })
    } else {
        None
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(request.prompt.clone()),
            }],
        }],
        system_instruction,
        tools,
        generation_config,
    }
}

/// Convert an API response into the provider-neutral shape.
///
/// Only the first candidate is used. Grounding chunks without a web uri are dropped.
fn into_llm_response(response: GenerateContentResponse, model: &str) -> LlmResponse {
    let candidate = response.candidates.into_iter().next();

    let (content, sources) = match candidate {
        Some(candidate) => {
            let content = candidate
                .content
                .map(|c| {
                    c.parts
                        .into_iter()
                        .filter_map(|p| p.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default();

            let sources = candidate
                .grounding_metadata
                .map(|m| {
                    m.grounding_chunks
                        .into_iter()
                        .filter_map(|chunk| chunk.web)
                        .filter_map(|web| match web.uri {
                            Some(uri) if !uri.is_empty() => Some(GroundingSource::new(uri, web.title)),
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default();

            (content, sources)
        }
        None => (String::new(), Vec::new()),
    };

    let usage = response.usage_metadata.map(|u| TokenUsage {
        input_tokens: u.prompt_token_count,
        output_tokens: u.candidates_token_count,
    });

    LlmResponse {
        content,
        model: model.to_string(),
        sources,
        usage,
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let api_request = build_request(&request);

        log::debug!(
            "Gemini request: model={}, web_search={}",
            self.model,
            request.web_search
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            return Err(LlmError::from_status(status.as_u16(), message, retry_after));
        }

        let api_response: GenerateContentResponse =
            response.json().await.map_err(|e| LlmError::ApiError {
                message: format!("Failed to parse response: {}", e),
                status_code: None,
            })?;

        Ok(into_llm_response(api_response, &self.model))
    }

    fn name(&self) -> &'static str {
        "Gemini API"
    }

    fn is_available(&self) -> Result<()> {
        // API key was validated in constructor
        Ok(())
    }
}
