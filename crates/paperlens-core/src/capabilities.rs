//! Startup capability descriptor.
//!
//! Computed once when the process starts (one health check against the
//! structuring service, provider resolution for the summarizer) and passed
//! to everything that would otherwise probe for optional components.

use serde::{Deserialize, Serialize};

/// Which extraction path the hybrid structurer may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionRoute {
    /// Try the structuring service first, fall back to local extraction.
    PrimaryWithFallback,
    /// Structuring service is unreachable; go straight to local extraction.
    FallbackOnly,
}

impl std::fmt::Display for ExtractionRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrimaryWithFallback => write!(f, "primary_with_fallback"),
            Self::FallbackOnly => write!(f, "fallback_only"),
        }
    }
}

/// Components discovered at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// The external structuring service answered its health check.
    pub structuring_service: bool,
    /// A summarization provider is configured.
    pub summarizer: bool,
    /// Local PDF text extraction is compiled in.
    pub local_extraction: bool,
}

impl Capabilities {
    pub fn new(structuring_service: bool, summarizer: bool) -> Self {
        Self {
            structuring_service,
            summarizer,
            local_extraction: true,
        }
    }

    /// Only local extraction, no external services.
    pub fn offline() -> Self {
        Self::new(false, false)
    }

    pub fn extraction_route(&self) -> ExtractionRoute {
        if self.structuring_service {
            ExtractionRoute::PrimaryWithFallback
        } else {
            ExtractionRoute::FallbackOnly
        }
    }
}
