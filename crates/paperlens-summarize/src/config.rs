//! Summarizer provider configuration (`llm-config.json`).
//!
//! ```json
//! { "preferred_provider": "auto",
//!   "anthropic": { "api_key": "sk-ant-...", "model": "claude-3-5-haiku-20241022" } }
//! ```
//!
//! Keys missing from the file fall back to `OPENAI_API_KEY`,
//! `ANTHROPIC_API_KEY` and `GROQ_API_KEY`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{LLMProvider, ResolvedProvider};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";

/// Which provider to use. `Auto` picks Anthropic, then Groq, then OpenAI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderPreference {
    #[default]
    Auto,
    OpenAI,
    Anthropic,
    Groq,
}

/// Key and model for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
}

impl ProviderSettings {
    fn with_model(model: &str) -> Self {
        Self {
            api_key: None,
            model: model.into(),
        }
    }

    fn resolve(&self, provider: LLMProvider) -> Option<ResolvedProvider> {
        let key = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        Some(ResolvedProvider {
            provider,
            model: self.model.clone(),
            api_key: key.to_string(),
        })
    }

    fn key_from_env(&mut self, var: &str) {
        if self.api_key.is_none() {
            self.api_key = std::env::var(var).ok();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    pub preferred_provider: ProviderPreference,
    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    pub groq: ProviderSettings,
    /// Completion endpoint override, e.g. a self-hosted gateway.
    pub endpoint: Option<String>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: ProviderPreference::Auto,
            openai: ProviderSettings::with_model(DEFAULT_OPENAI_MODEL),
            anthropic: ProviderSettings::with_model(DEFAULT_ANTHROPIC_MODEL),
            groq: ProviderSettings::with_model(DEFAULT_GROQ_MODEL),
            endpoint: None,
        }
    }
}

impl LLMConfig {
    /// File contents with environment keys filling the gaps.
    pub fn load(config_path: &Path) -> Self {
        let mut config = Self::from_file(config_path);
        config.openai.key_from_env("OPENAI_API_KEY");
        config.anthropic.key_from_env("ANTHROPIC_API_KEY");
        config.groq.key_from_env("GROQ_API_KEY");
        config
    }

    /// File contents only. A missing file gives defaults; an unparsable one
    /// is logged and also gives defaults.
    pub fn from_file(config_path: &Path) -> Self {
        let Ok(raw) = std::fs::read_to_string(config_path) else {
            debug!("No LLM config at {}", config_path.display());
            return Self::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring {}: {}", config_path.display(), e);
            Self::default()
        })
    }

    /// Provider, model and key to use, if any provider has a key.
    pub fn resolve_provider(&self) -> Option<ResolvedProvider> {
        match self.preferred_provider {
            ProviderPreference::OpenAI => self.openai.resolve(LLMProvider::OpenAI),
            ProviderPreference::Anthropic => self.anthropic.resolve(LLMProvider::Anthropic),
            ProviderPreference::Groq => self.groq.resolve(LLMProvider::Groq),
            ProviderPreference::Auto => self
                .anthropic
                .resolve(LLMProvider::Anthropic)
                .or_else(|| self.groq.resolve(LLMProvider::Groq))
                .or_else(|| self.openai.resolve(LLMProvider::OpenAI)),
        }
    }
}
