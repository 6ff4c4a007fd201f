//! LLM Provider Trait
//!
//! Defines the common interface for all LLM providers, plus the shared
//! response-text extraction machinery.
//!
//! ## Extraction Strategies
//!
//! Backends occasionally shift their response shape between API revisions.
//! Instead of ad hoc branching, each adapter declares a small ordered list
//! of named [`Extraction`] strategies (primary shape first, fallback shape
//! second); the first one that yields text wins, and a payload matching
//! none of them is a protocol error.

use async_trait::async_trait;

use super::types::{LlmResult, ProviderError, ProviderRequest};

/// Trait that all LLM providers must implement.
///
/// `invoke` always completes with either generated text or a classified
/// [`ProviderError`]; adapters never propagate an unhandled error.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable provider identifier ("openai", "anthropic", "gemini").
    fn id(&self) -> &'static str;

    /// The model this instance sends requests to.
    fn model(&self) -> &str;

    /// Serialize the request into the backend's native shape, perform one
    /// network call, and normalize the response.
    async fn invoke(&self, request: &ProviderRequest) -> LlmResult<String>;
}

/// A named way of pulling generated text out of a response payload.
pub struct Extraction {
    /// Shape name, used in trace output when a fallback shape matches.
    pub name: &'static str,
    pub extract: fn(&serde_json::Value) -> Option<String>,
}

/// Try each strategy in order; first match wins.
pub fn extract_text(
    provider: &str,
    payload: &serde_json::Value,
    strategies: &[Extraction],
) -> LlmResult<String> {
    for (index, strategy) in strategies.iter().enumerate() {
        if let Some(text) = (strategy.extract)(payload) {
            if index > 0 {
                tracing::debug!(
                    provider,
                    shape = strategy.name,
                    "response matched fallback shape"
                );
            }
            return Ok(text);
        }
    }
    Err(ProviderError::protocol(format!(
        "{}: response matched no known shape ({})",
        provider,
        strategies
            .iter()
            .map(|s| s.name)
            .collect::<Vec<_>>()
            .join(", ")
    )))
}

/// Error for an invocation attempted without a configured credential.
pub fn missing_api_key_error(provider: &str) -> ProviderError {
    ProviderError::Upstream {
        status: None,
        message: format!("API key not configured for {}", provider),
    }
}

/// Parse a response body into JSON, classifying failure as a protocol error.
pub fn parse_payload(provider: &str, body: &str) -> LlmResult<serde_json::Value> {
    serde_json::from_str(body).map_err(|e| {
        ProviderError::protocol(format!("{}: response is not valid JSON: {}", provider, e))
    })
}
