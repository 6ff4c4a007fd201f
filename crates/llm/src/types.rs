//! Provider Types
//!
//! Shared types for the LLM provider layer: the backend-agnostic request,
//! the per-provider result with its success/failure outcome, the provider
//! error taxonomy, and provider configuration.

use serde::{Deserialize, Serialize};

/// Maximum number of upstream body bytes echoed into an error message.
const ERROR_SNIPPET_LEN: usize = 200;

/// The providers Crosscheck knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    /// Stable identifier used in result maps, artifact filenames, and config.
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Default model when no override is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Anthropic => "claude-3-opus-20240229",
            ProviderKind::Gemini => "gemini-1.5-pro",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// Configuration for a single provider instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which backend this configuration is for.
    pub kind: ProviderKind,
    /// API credential. `None` makes every invocation fail with an
    /// authorization-shaped `Upstream` error rather than a panic.
    pub api_key: Option<String>,
    /// Model identifier sent to the backend.
    pub model: String,
    /// Endpoint override; each adapter has a sensible default.
    pub base_url: Option<String>,
    /// Completion budget forwarded to the backend.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Anthropic wire-protocol version header.
    pub api_version: Option<String>,
}

impl ProviderConfig {
    /// A configuration with per-kind defaults and no credential.
    pub fn for_kind(kind: ProviderKind) -> Self {
        Self {
            kind,
            api_key: None,
            model: kind.default_model().to_string(),
            base_url: None,
            max_tokens: 4000,
            temperature: 0.3,
            api_version: None,
        }
    }
}

/// Backend-agnostic request: constructed once and reused for every provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub system_prompt: String,
    pub user_message: String,
}

impl ProviderRequest {
    pub fn new(system_prompt: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_message: user_message.into(),
        }
    }
}

/// Errors a provider invocation can terminate with. Every failure path in an
/// adapter ends in one of these; nothing escapes `invoke` as a panic or a
/// raw transport error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderError {
    /// The backend answered with a non-success status (or the credential is
    /// missing/rejected). `status` is `None` when no HTTP exchange happened.
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// HTTP success but the payload did not match any known response shape.
    Protocol { message: String },

    /// Network failure or timeout before a response was classified.
    Transport { message: String },
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstream {
                status: Some(code),
                message,
            } => write!(f, "upstream error (HTTP {}): {}", code, message),
            Self::Upstream {
                status: None,
                message,
            } => write!(f, "upstream error: {}", message),
            Self::Protocol { message } => write!(f, "protocol error: {}", message),
            Self::Transport { message } => write!(f, "transport error: {}", message),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Upstream error carrying an HTTP status and a bounded body snippet.
    pub fn upstream(status: u16, body: &str) -> Self {
        Self::Upstream {
            status: Some(status),
            message: snippet(body),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Bound an upstream body to a short diagnostic snippet.
pub fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= ERROR_SNIPPET_LEN {
        return trimmed.to_string();
    }
    let mut end = ERROR_SNIPPET_LEN;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

/// Result alias used inside adapters.
pub type LlmResult<T> = Result<T, ProviderError>;

/// Exactly one outcome per provider per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProviderOutcome {
    Success { text: String },
    Failure { error: ProviderError },
}

/// The normalized outcome of invoking one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResult {
    pub provider_id: String,
    #[serde(flatten)]
    pub outcome: ProviderOutcome,
}

impl ProviderResult {
    pub fn success(provider_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            outcome: ProviderOutcome::Success { text: text.into() },
        }
    }

    pub fn failure(provider_id: impl Into<String>, error: ProviderError) -> Self {
        Self {
            provider_id: provider_id.into(),
            outcome: ProviderOutcome::Failure { error },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ProviderOutcome::Success { .. })
    }

    /// The generated text, or a short diagnostic line for failures. This is
    /// what lands in the per-provider text artifact.
    pub fn display_text(&self) -> String {
        match &self.outcome {
            ProviderOutcome::Success { text } => text.clone(),
            ProviderOutcome::Failure { error } => format!("Analysis failed: {}", error),
        }
    }
}
