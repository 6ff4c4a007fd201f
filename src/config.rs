//! Analyzer Configuration
//!
//! One explicit configuration struct constructed at process start and passed
//! by reference into the orchestrator; components never consult ambient
//! global state. Every non-credential option has a default, so an absent or
//! partial config file never blocks execution.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crosscheck_llm::{
    AnthropicProvider, GeminiProvider, LlmProvider, OpenAiProvider, ProviderConfig, ProviderKind,
};

use crate::services::retrieval::DEFAULT_CHROMA_URL;
use crate::utils::error::{AppError, AppResult};

/// Per-provider configuration overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Top-level analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Similarity-search service endpoint.
    pub search_url: String,
    /// Documentation collection name.
    pub doc_collection: String,
    /// Chat collection name.
    pub chat_collection: String,
    /// Passages to request from each collection.
    pub retrieve_k: usize,
    /// Context budget in estimated tokens.
    pub max_input_tokens: usize,
    /// Providers to dispatch to, by id.
    pub providers: Vec<String>,
    /// Per-provider call deadline.
    pub request_timeout_secs: u64,
    /// Where run artifacts are written.
    pub output_dir: PathBuf,
    /// Pause between prompts in batch mode.
    pub batch_delay_secs: u64,
    /// Anthropic wire-protocol version header.
    pub anthropic_api_version: Option<String>,

    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    pub gemini: ProviderSettings,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_CHROMA_URL.to_string(),
            doc_collection: "documentation".to_string(),
            chat_collection: "chat_messages".to_string(),
            retrieve_k: 30,
            max_input_tokens: 12_000,
            providers: vec![
                "openai".to_string(),
                "anthropic".to_string(),
                "gemini".to_string(),
            ],
            request_timeout_secs: 120,
            output_dir: PathBuf::from("outputs"),
            batch_delay_secs: 5,
            anthropic_api_version: None,
            openai: ProviderSettings::default(),
            anthropic: ProviderSettings::default(),
            gemini: ProviderSettings::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    /// Parse from a TOML string.
    pub fn from_toml(raw: &str) -> AppResult<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| AppError::config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.retrieve_k == 0 {
            return Err(AppError::validation("retrieve_k must be at least 1"));
        }
        Ok(())
    }

    /// Fill missing credentials from the process environment. Called once
    /// at startup by the binary; library consumers set keys directly.
    pub fn credentials_from_env(&mut self) {
        let fill = |slot: &mut Option<String>, var: &str| {
            if slot.is_none() {
                if let Ok(value) = std::env::var(var) {
                    if !value.is_empty() {
                        *slot = Some(value);
                    }
                }
            }
        };
        fill(&mut self.openai.api_key, "OPENAI_API_KEY");
        fill(&mut self.anthropic.api_key, "ANTHROPIC_API_KEY");
        fill(&mut self.gemini.api_key, "GEMINI_API_KEY");
    }

    /// Build the selected provider adapters. Unknown provider names are
    /// logged and skipped rather than failing the run.
    pub fn build_providers(&self) -> Vec<Arc<dyn LlmProvider>> {
        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();
        for name in &self.providers {
            let kind = match name.parse::<ProviderKind>() {
                Ok(kind) => kind,
                Err(_) => {
                    tracing::warn!(provider = %name, "unknown provider; skipping");
                    continue;
                }
            };
            let config = self.provider_config(kind);
            providers.push(match kind {
                ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(config)),
                ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(config)),
                ProviderKind::Gemini => Arc::new(GeminiProvider::new(config)),
            });
        }
        providers
    }

    /// Resolve one provider's effective configuration.
    pub fn provider_config(&self, kind: ProviderKind) -> ProviderConfig {
        let settings = match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::Gemini => &self.gemini,
        };

        let mut config = ProviderConfig::for_kind(kind);
        config.api_key = settings.api_key.clone();
        if let Some(model) = &settings.model {
            config.model = model.clone();
        }
        config.base_url = settings.base_url.clone();
        if kind == ProviderKind::Anthropic {
            config.api_version = self.anthropic_api_version.clone();
        }
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_secs(self.batch_delay_secs)
    }
}
