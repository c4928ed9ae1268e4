//! Summarization adapter.
//!
//! Forwards the first short-form chunk of a paper's abstract (or opening
//! section) to a configured LLM provider. Without a provider, or when the
//! provider fails, the summary degrades to the first sentence of the input.

use std::time::Duration;

use async_trait::async_trait;
use paperlens_core::{Consumer, Document, Result};
use paperlens_ingest::{clean_text, split_sentences, Chunker};
use reqwest::Client;
use tracing::{info, warn};

use crate::config::LLMConfig;
use crate::providers::{complete, CompletionRequest};
use crate::types::{ResolvedProvider, Summary, SummaryMethod};

/// Inputs shorter than this are not summarised.
pub const MIN_INPUT_CHARS: usize = 50;
/// Characters taken from the first section when there is no abstract.
pub const SECTION_INPUT_CHARS: usize = 1000;

const SYSTEM_PROMPT: &str = "You summarise research papers. Reply with two or three plain sentences \
stating the problem, the approach and the main result. No preamble, no markdown.";
const MAX_TOKENS: usize = 200;
const TEMPERATURE: f64 = 0.3;

/// External summarization model.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Whether a model is configured at all.
    fn is_available(&self) -> bool;

    /// Model identifier recorded with generated summaries.
    fn model_name(&self) -> Option<String>;

    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Summarizer backed by a hosted chat-completion API.
pub struct LlmSummarizer {
    client: Client,
    resolved: ResolvedProvider,
    endpoint: String,
    timeout: Duration,
}

impl LlmSummarizer {
    pub fn new(resolved: ResolvedProvider, endpoint: Option<String>, timeout: Duration) -> Self {
        let endpoint = endpoint.unwrap_or_else(|| resolved.provider.endpoint().to_string());
        Self {
            client: Client::new(),
            resolved,
            endpoint,
            timeout,
        }
    }

    /// `None` when no provider has a usable API key.
    pub fn from_config(config: &LLMConfig, timeout: Duration) -> Option<Self> {
        let resolved = config.resolve_provider()?;
        info!("Summarizer: {} ({})", resolved.provider, resolved.model);
        Some(Self::new(resolved, config.endpoint.clone(), timeout))
    }

    pub fn provider(&self) -> &ResolvedProvider {
        &self.resolved
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> Option<String> {
        Some(self.resolved.model.clone())
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let request = CompletionRequest {
            endpoint: &self.endpoint,
            model: &self.resolved.model,
            api_key: &self.resolved.api_key,
            system: SYSTEM_PROMPT,
            prompt: text,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            timeout: self.timeout,
        };
        complete(&self.client, self.resolved.provider, &request).await
    }
}

/// Stand-in used when no provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSummarizer;

#[async_trait]
impl Summarizer for NoopSummarizer {
    fn is_available(&self) -> bool {
        false
    }

    fn model_name(&self) -> Option<String> {
        None
    }

    async fn summarize(&self, _text: &str) -> Result<String> {
        Err(paperlens_core::Error::Summarization(
            "no summarization provider configured".into(),
        ))
    }
}

fn summary_input(doc: &Document) -> String {
    if !doc.abstract_text.trim().is_empty() {
        return doc.abstract_text.clone();
    }
    doc.sections
        .values()
        .next()
        .map(|text| text.chars().take(SECTION_INPUT_CHARS).collect())
        .unwrap_or_default()
}

fn first_sentence_summary(cleaned: &str, error: Option<String>) -> Summary {
    let text = split_sentences(cleaned)
        .first()
        .map(|s| s.to_string())
        .unwrap_or_else(|| cleaned.to_string());
    Summary {
        text,
        method: SummaryMethod::AbstractFallback,
        model: None,
        error,
    }
}

/// Summarise one document, degrading to its first sentence when the model
/// is absent or fails.
pub async fn summarize_document(
    doc: &Document,
    summarizer: &dyn Summarizer,
    chunker: &Chunker,
) -> Summary {
    let input = summary_input(doc);
    if input.trim().chars().count() < MIN_INPUT_CHARS {
        return Summary {
            text: "Insufficient content for summary".into(),
            method: SummaryMethod::Insufficient,
            model: None,
            error: None,
        };
    }

    let cleaned = clean_text(&input);
    if !summarizer.is_available() {
        return first_sentence_summary(&cleaned, None);
    }

    let prompt = chunker
        .chunks(&cleaned, Consumer::ShortForm)
        .iter()
        .next()
        .map(|chunk| chunk.text)
        .unwrap_or_else(|| cleaned.clone());

    match summarizer.summarize(&prompt).await {
        Ok(text) => Summary {
            text,
            method: SummaryMethod::Model,
            model: summarizer.model_name(),
            error: None,
        },
        Err(e) => {
            warn!("Summarization failed for {}, using first sentence: {}", doc.id, e);
            first_sentence_summary(&cleaned, Some(e.to_string()))
        }
    }
}
