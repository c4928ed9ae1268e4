//! Error types for PaperLens.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Service unreachable: {0}")]
    Connectivity(String),

    #[error("Timed out after {secs}s: {context}")]
    Timeout { context: String, secs: u64 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("All extraction methods failed (primary: {primary}; fallback: {fallback})")]
    ExtractionExhausted { primary: String, fallback: String },

    #[error("Summarization error: {0}")]
    Summarization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
