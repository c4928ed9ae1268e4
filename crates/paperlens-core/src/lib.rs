//! PaperLens Core — shared document types, configuration, capability descriptor, errors.

pub mod capabilities;
pub mod config;
pub mod document;
pub mod error;

pub use capabilities::{Capabilities, ExtractionRoute};
pub use config::{
    ChunkBudget, ChunkBudgets, CollectorConfig, DataPaths, HealthCheckConfig, PaperLensConfig,
    StructuringConfig, TierBudgets, TimeoutTier,
};
pub use document::{
    Consumer, Document, ExtractionDetails, ExtractionMethod, PaperMetadata, SectionMap,
    DEFAULT_SECTION, UNKNOWN_TITLE,
};
pub use error::{Error, Result};
