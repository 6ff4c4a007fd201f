//! Crosscheck LLM
//!
//! Provides a unified interface for dispatching one analysis prompt to
//! multiple LLM providers:
//! - OpenAI (chat completions)
//! - Anthropic Claude (messages)
//! - Google Gemini (generateContent)
//!
//! Each provider adapter normalizes its backend's wire format and failure
//! modes into a uniform [`ProviderResult`]; the [`dispatch`] module fans a
//! single request out to every selected provider concurrently and joins all
//! outcomes without letting one failure abort the others.

pub mod anthropic;
pub mod dispatch;
pub mod gemini;
pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use anthropic::AnthropicProvider;
pub use dispatch::dispatch_all;
pub use gemini::GeminiProvider;
pub use http_client::build_http_client;
pub use openai::OpenAiProvider;
pub use provider::LlmProvider;
pub use types::*;
