//! Single-paper processing: structure → summarize → chunk → persist.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use paperlens_core::{Capabilities, Consumer, Result};
use paperlens_ingest::Chunker;
use paperlens_structure::{HybridStructurer, ProcessingStats};
use paperlens_summarize::{summarize_document, Summarizer};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::types::{ChunkCounts, PaperSummary};

/// Hex SHA-256 of a file's bytes.
pub async fn content_hash(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

pub struct PaperProcessor {
    structurer: HybridStructurer,
    summarizer: Arc<dyn Summarizer>,
    chunker: Chunker,
    capabilities: Capabilities,
    output_dir: PathBuf,
}

impl PaperProcessor {
    pub fn new(
        structurer: HybridStructurer,
        summarizer: Arc<dyn Summarizer>,
        chunker: Chunker,
        capabilities: Capabilities,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            structurer,
            summarizer,
            chunker,
            capabilities,
            output_dir: output_dir.into(),
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn stats(&self) -> ProcessingStats {
        self.structurer.stats()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn summary_path(&self, paper_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}_summary.json", paper_id))
    }

    /// Process one PDF and write `<output_dir>/<paper_id>_summary.json`.
    pub async fn process(&self, path: &Path) -> Result<PaperSummary> {
        let doc = self.structurer.structure(path).await?;
        let content_hash = content_hash(path).await?;

        let summary = summarize_document(&doc, self.summarizer.as_ref(), &self.chunker).await;
        let chunk_counts = ChunkCounts {
            short_form: self.chunker.chunk_document(&doc, Consumer::ShortForm).len(),
            long_form: self.chunker.chunk_document(&doc, Consumer::LongForm).len(),
        };

        let result = PaperSummary {
            paper_id: doc.id.clone(),
            content_hash,
            title: doc.title.clone(),
            authors: doc.authors.clone(),
            method: doc.method,
            summary,
            sections_found: doc.sections.keys().cloned().collect(),
            sections: doc.sections.clone(),
            abstract_text: doc.abstract_text.clone(),
            chunk_counts,
            extraction: doc.details.clone(),
            ai_enhanced: self.summarizer.is_available(),
            processed_at: Utc::now(),
        };

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let out = self.summary_path(&result.paper_id);
        tokio::fs::write(&out, serde_json::to_vec_pretty(&result)?).await?;
        info!(
            "Processed {} ({}, {} sections), saved {}",
            result.paper_id,
            result.method,
            result.sections_found.len(),
            out.display()
        );
        Ok(result)
    }
}
