//! PaperLens Structure — turns a PDF into a sectioned `Document`.
//!
//! The primary path posts the file to a GROBID server with escalating timeout
//! tiers and parses its TEI response. When that path is unavailable or fails,
//! local page text plus heuristic segmentation takes over.

pub mod client;
pub mod health;
pub mod hybrid;
pub mod tei;

pub use client::{GrobidClient, StructuringService};
pub use health::wait_until_alive;
pub use hybrid::{HybridStructurer, ProcessingStats};
pub use paperlens_core::{TierBudgets, TimeoutTier};
pub use tei::parse_tei;
