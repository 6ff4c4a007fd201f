//! Anthropic Provider
//!
//! Implementation of the LlmProvider trait for the Anthropic messages API.
//! Unlike OpenAI, the system prompt is a top-level `system` field rather
//! than a message, and the response carries a content-block array.

use async_trait::async_trait;

use super::http_client::build_http_client;
use super::provider::{extract_text, missing_api_key_error, parse_payload, Extraction, LlmProvider};
use super::types::{LlmResult, ProviderConfig, ProviderError, ProviderRequest};

/// Default Anthropic messages endpoint
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Wire protocol version sent when the config carries no override.
const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Expected response shapes, primary first.
const EXTRACTIONS: &[Extraction] = &[
    // Messages API: content is an array of typed blocks.
    Extraction {
        name: "messages.content",
        extract: |v| v["content"][0]["text"].as_str().map(str::to_string),
    },
    // Pre-messages completion shape.
    Extraction {
        name: "legacy.completion",
        extract: |v| v["completion"].as_str().map(str::to_string),
    },
];

/// Anthropic provider
pub struct AnthropicProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the given configuration
    pub fn new(config: ProviderConfig) -> Self {
        let client = build_http_client();
        Self { config, client }
    }

    fn endpoint(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(ANTHROPIC_API_URL)
    }

    fn api_version(&self) -> &str {
        self.config
            .api_version
            .as_deref()
            .unwrap_or(DEFAULT_API_VERSION)
    }

    /// Build the request body for the API
    fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": request.system_prompt,
            "messages": [
                { "role": "user", "content": request.user_message }
            ]
        })
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn id(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, request: &ProviderRequest) -> LlmResult<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("anthropic"))?;

        tracing::info!(model = %self.config.model, "sending request to Anthropic");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", api_key)
            .header("anthropic-version", self.api_version())
            .header("Content-Type", "application/json")
            .json(&self.build_request_body(request))
            .send()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;

        if status != 200 {
            return Err(ProviderError::upstream(status, &body));
        }

        let payload = parse_payload("anthropic", &body)?;
        extract_text("anthropic", &payload, EXTRACTIONS)
    }
}
