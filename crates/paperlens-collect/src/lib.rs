//! PaperLens Collect — arXiv metadata search, PDF download and metadata
//! persistence.

pub mod client;
pub mod download;
pub mod feed;
pub mod store;

pub use client::ArxivClient;
pub use feed::parse_feed;
pub use store::{save_metadata_json, save_metadata_jsonl};

/// Categories searched when none are given.
pub const DEFAULT_CATEGORIES: &[&str] = &["cs.AI", "cs.CL", "cs.LG"];
