//! Gemini Provider
//!
//! Implementation of the LlmProvider trait for Google's generateContent
//! API. The model name is part of the URL path, the credential travels as
//! a query parameter, and the system prompt uses `system_instruction`.

use async_trait::async_trait;

use super::http_client::build_http_client;
use super::provider::{extract_text, missing_api_key_error, parse_payload, Extraction, LlmProvider};
use super::types::{LlmResult, ProviderConfig, ProviderError, ProviderRequest};

/// Default Gemini API base (model name and method are appended).
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Expected response shapes, primary first.
const EXTRACTIONS: &[Extraction] = &[
    // Single-part candidate, the common case.
    Extraction {
        name: "candidates.first_part",
        extract: |v| {
            v["candidates"][0]["content"]["parts"][0]["text"]
                .as_str()
                .map(str::to_string)
        },
    },
    // Multi-part candidate: join all text parts of the first candidate.
    Extraction {
        name: "candidates.joined_parts",
        extract: |v| {
            let parts = v["candidates"][0]["content"]["parts"].as_array()?;
            let texts: Vec<&str> = parts.iter().filter_map(|p| p["text"].as_str()).collect();
            if texts.is_empty() {
                None
            } else {
                Some(texts.join(""))
            }
        },
    },
];

/// Gemini provider
pub struct GeminiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given configuration
    pub fn new(config: ProviderConfig) -> Self {
        let client = build_http_client();
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_API_BASE)
            .trim_end_matches('/');
        format!("{}/models/{}:generateContent", base, self.config.model)
    }

    /// Build the request body for the API
    fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [{ "text": request.user_message }] }
            ],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens,
                "topP": 0.95,
            }
        });

        if !request.system_prompt.is_empty() {
            body["system_instruction"] = serde_json::json!({
                "parts": [{ "text": request.system_prompt }]
            });
        }

        body
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn id(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, request: &ProviderRequest) -> LlmResult<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("gemini"))?;

        tracing::info!(model = %self.config.model, "sending request to Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key.as_str())])
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

        let payload = parse_payload("gemini", &body)?;
        extract_text("gemini", &payload, EXTRACTIONS)
    }
}
