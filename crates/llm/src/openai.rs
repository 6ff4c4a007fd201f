//! OpenAI Provider
//!
//! Implementation of the LlmProvider trait for OpenAI's chat completions
//! API. The system prompt travels as a dedicated system-role message.

use async_trait::async_trait;

use super::http_client::build_http_client;
use super::provider::{extract_text, missing_api_key_error, parse_payload, Extraction, LlmProvider};
use super::types::{LlmResult, ProviderConfig, ProviderError, ProviderRequest};

/// Default OpenAI chat completions endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Expected response shapes, primary first.
const EXTRACTIONS: &[Extraction] = &[
    // Current chat completions shape.
    Extraction {
        name: "chat.completion",
        extract: |v| v["choices"][0]["message"]["content"].as_str().map(str::to_string),
    },
    // Legacy text completions shape, still emitted by some compatible gateways.
    Extraction {
        name: "text.completion",
        extract: |v| v["choices"][0]["text"].as_str().map(str::to_string),
    },
];

/// OpenAI provider
pub struct OpenAiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with the given configuration
    pub fn new(config: ProviderConfig) -> Self {
        let client = build_http_client();
        Self { config, client }
    }

    fn endpoint(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL)
    }

    /// Build the request body for the API
    fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_message }
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn id(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, request: &ProviderRequest) -> LlmResult<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("openai"))?;

        tracing::info!(model = %self.config.model, "sending request to OpenAI");

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
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

        let payload = parse_payload("openai", &body)?;
        extract_text("openai", &payload, EXTRACTIONS)
    }
}
