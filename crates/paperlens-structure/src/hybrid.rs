//! Hybrid structurer: GROBID with escalating timeouts, local fallback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use paperlens_core::{
    Capabilities, Document, Error, ExtractionMethod, ExtractionRoute, Result, TierBudgets,
};
use paperlens_ingest::{segment_text, validate_document_path, PageTextExtractor};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::StructuringService;
use crate::tei::parse_tei;

/// Counters for the lifetime of one structurer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub primary_success: usize,
    pub primary_timeout: usize,
    pub fallback_used: usize,
    pub total_processed: usize,
    pub failures: usize,
}

pub struct HybridStructurer {
    service: Arc<dyn StructuringService>,
    extractor: Arc<dyn PageTextExtractor>,
    tiers: TierBudgets,
    route: ExtractionRoute,
    raw_xml_dir: Option<PathBuf>,
    stats: Mutex<ProcessingStats>,
}

impl HybridStructurer {
    pub fn new(
        service: Arc<dyn StructuringService>,
        extractor: Arc<dyn PageTextExtractor>,
        tiers: TierBudgets,
        capabilities: &Capabilities,
    ) -> Self {
        Self {
            service,
            extractor,
            tiers,
            route: capabilities.extraction_route(),
            raw_xml_dir: None,
            stats: Mutex::new(ProcessingStats::default()),
        }
    }

    /// Save every TEI response as `<dir>/<id>.tei.xml`.
    pub fn with_raw_xml_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.raw_xml_dir = Some(dir.into());
        self
    }

    pub fn route(&self) -> ExtractionRoute {
        self.route
    }

    pub fn stats(&self) -> ProcessingStats {
        self.stats.lock().clone()
    }

    /// Produce a document from a PDF, or fail with the reason from both paths.
    pub async fn structure(&self, path: &Path) -> Result<Document> {
        let size = validate_document_path(path)?;
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        self.stats.lock().total_processed += 1;

        let primary_error = match self.route {
            ExtractionRoute::PrimaryWithFallback => match self.try_primary(path, &id, size).await {
                Ok(doc) => {
                    self.stats.lock().primary_success += 1;
                    info!("Structured {} via GROBID", id);
                    return Ok(doc);
                }
                Err(e) => {
                    warn!("GROBID failed for {}, using local extraction: {}", id, e);
                    e.to_string()
                }
            },
            ExtractionRoute::FallbackOnly => {
                info!("Structuring service unavailable, local extraction for {}", id);
                "structuring service unavailable".to_string()
            }
        };

        match self.run_fallback(path, &id).await {
            Ok(doc) => {
                self.stats.lock().fallback_used += 1;
                info!(
                    "Structured {} via local extraction ({} sections)",
                    id,
                    doc.sections.len()
                );
                Ok(doc)
            }
            Err(e) => {
                self.stats.lock().failures += 1;
                Err(Error::ExtractionExhausted {
                    primary: primary_error,
                    fallback: e.to_string(),
                })
            }
        }
    }

    async fn try_primary(&self, path: &Path, id: &str, size: u64) -> Result<Document> {
        let start = TierBudgets::estimate(size);
        let mut last_timeout = None;

        for tier in TierBudgets::escalation(start) {
            let budget = self.tiers.budget(tier);
            info!(
                "GROBID attempt for {} with '{}' tier ({}s)",
                id,
                tier,
                budget.as_secs()
            );

            let outcome = tokio::time::timeout(budget, self.service.structure(path, budget))
                .await
                .unwrap_or_else(|_| {
                    Err(Error::Timeout {
                        context: format!("'{}' tier", tier),
                        secs: budget.as_secs(),
                    })
                });

            match outcome {
                Ok(xml) => {
                    self.save_raw_xml(id, &xml).await;
                    return parse_tei(&xml, id);
                }
                Err(e) if e.is_timeout() => {
                    warn!("GROBID '{}' tier timed out for {}", tier, id);
                    self.stats.lock().primary_timeout += 1;
                    last_timeout = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_timeout.unwrap_or_else(|| Error::Internal("no timeout tiers".into())))
    }

    async fn run_fallback(&self, path: &Path, id: &str) -> Result<Document> {
        let extractor = self.extractor.clone();
        let owned = path.to_path_buf();
        let (pages, segmented) = tokio::task::spawn_blocking(move || {
            let pages = extractor.extract_pages(&owned)?;
            let segmented = segment_text(&pages.join("\n"))?;
            Ok::<_, Error>((pages.len(), segmented))
        })
        .await
        .map_err(|e| Error::Internal(format!("fallback task failed: {}", e)))??;

        let mut doc = Document::new(
            id,
            segmented.title,
            Vec::new(),
            segmented.abstract_text,
            segmented.sections,
            ExtractionMethod::Fallback,
        );
        doc.details.total_pages = Some(pages);
        doc.details.total_characters = Some(segmented.total_characters);
        Ok(doc)
    }

    async fn save_raw_xml(&self, id: &str, xml: &str) {
        let Some(dir) = &self.raw_xml_dir else {
            return;
        };
        let target = dir.join(format!("{}.tei.xml", id));
        match tokio::fs::write(&target, xml).await {
            Ok(()) => info!("Saved TEI XML: {} ({} chars)", target.display(), xml.len()),
            Err(e) => warn!("Could not save TEI XML to {}: {}", target.display(), e),
        }
    }
}
