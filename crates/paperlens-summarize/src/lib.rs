//! Summarization adapter for external LLM providers (OpenAI/Anthropic/Groq).
//!
//! Sends one short-form chunk per paper as a non-streaming completion and
//! degrades to the paper's own first sentence when no model is reachable.

pub mod config;
pub mod providers;
pub mod summarizer;
pub mod types;

pub use config::{LLMConfig, ProviderPreference, ProviderSettings};
pub use summarizer::{summarize_document, LlmSummarizer, NoopSummarizer, Summarizer};
pub use types::*;
