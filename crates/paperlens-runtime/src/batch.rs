//! Batch processing of a PDF directory with a text report.

use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use paperlens_core::{ExtractionMethod, Result};
use tracing::{info, warn};

use crate::processor::{content_hash, PaperProcessor};
use crate::types::PaperSummary;

pub const REPORT_FILE: &str = "hybrid_processing_report.txt";

/// Outcome for one PDF in a batch.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Processed(Box<PaperSummary>),
    Failed { paper_id: String, error: String },
    Duplicate { paper_id: String, same_as: String },
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
    pub elapsed: Duration,
    pub report_path: PathBuf,
}

impl BatchReport {
    pub fn processed(&self) -> impl Iterator<Item = &PaperSummary> {
        self.outcomes.iter().filter_map(|o| match o {
            BatchOutcome::Processed(summary) => Some(summary.as_ref()),
            _ => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match o {
            BatchOutcome::Failed { paper_id, error } => Some((paper_id.as_str(), error.as_str())),
            _ => None,
        })
    }

    fn count_method(&self, method: ExtractionMethod) -> usize {
        self.processed().filter(|s| s.method == method).count()
    }

    fn render(&self, processor: &PaperProcessor) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_report(&mut out, processor);
        out
    }

    fn write_report(&self, out: &mut String, processor: &PaperProcessor) -> fmt::Result {
        let attempted = self.outcomes.len();
        let succeeded = self.processed().count();
        let failed = self.failed().count();
        let duplicates = attempted - succeeded - failed;
        let secs = self.elapsed.as_secs_f64();
        let per_paper = if attempted > 0 { secs / attempted as f64 } else { 0.0 };
        let rate = if attempted > 0 {
            succeeded as f64 * 100.0 / attempted as f64
        } else {
            0.0
        };
        let stats = processor.stats();
        let caps = processor.capabilities();

        writeln!(out, "HYBRID PROCESSING REPORT")?;
        writeln!(out, "{}", "=".repeat(70))?;
        writeln!(out)?;
        writeln!(out, "PROCESSING SUMMARY:")?;
        writeln!(out, "  Total Processing Time: {:.1} seconds", secs)?;
        writeln!(out, "  Average Time per Paper: {:.1}s", per_paper)?;
        writeln!(out, "  Total Papers Attempted: {}", attempted)?;
        writeln!(out)?;
        writeln!(out, "SUCCESS BREAKDOWN:")?;
        writeln!(out, "  Total Successful: {}", succeeded)?;
        writeln!(
            out,
            "  Structured (GROBID): {}",
            self.count_method(ExtractionMethod::Structured)
        )?;
        writeln!(out, "  Local Fallback: {}", self.count_method(ExtractionMethod::Fallback))?;
        writeln!(out, "  Duplicates Skipped: {}", duplicates)?;
        writeln!(out, "  Complete Failures: {}", failed)?;
        writeln!(out, "  Overall Success Rate: {}/{} ({:.1}%)", succeeded, attempted, rate)?;
        writeln!(out)?;
        writeln!(out, "STRUCTURER STATISTICS:")?;
        writeln!(out, "  Primary Success: {}", stats.primary_success)?;
        writeln!(out, "  Primary Timeouts: {}", stats.primary_timeout)?;
        writeln!(out, "  Fallback Used: {}", stats.fallback_used)?;
        writeln!(out, "  Failures: {}", stats.failures)?;
        writeln!(out)?;
        writeln!(out, "CAPABILITIES:")?;
        writeln!(out, "  Extraction Route: {}", caps.extraction_route())?;
        writeln!(
            out,
            "  Summarizer: {}",
            if caps.summarizer { "configured" } else { "unavailable" }
        )?;
        writeln!(
            out,
            "  AI-Enhanced Summaries: {}",
            self.processed().filter(|s| s.summary.is_model_generated()).count()
        )?;
        writeln!(out)?;
        writeln!(out, "OUTPUT DIRECTORY: {}", processor.output_dir().display())?;

        if succeeded > 0 {
            writeln!(out)?;
            writeln!(out, "SUCCESSFULLY PROCESSED:")?;
            for (i, summary) in self.processed().enumerate() {
                let title: String = summary.title.chars().take(40).collect();
                writeln!(
                    out,
                    "  {}. {}... ({}, {} sections)",
                    i + 1,
                    title,
                    summary.method,
                    summary.sections_found.len()
                )?;
            }
        }
        if failed > 0 {
            writeln!(out)?;
            writeln!(out, "FAILED PAPERS:")?;
            for (paper_id, error) in self.failed() {
                writeln!(out, "  - {}: {}", paper_id, error)?;
            }
        }
        Ok(())
    }
}

fn paper_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// PDFs in `dir`, sorted by file name.
fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

/// Process up to `max_papers` PDFs from `dir` in name order, skipping
/// duplicate content, and write the report next to the summaries.
pub async fn process_directory(
    processor: &PaperProcessor,
    dir: &Path,
    max_papers: usize,
) -> Result<BatchReport> {
    let pdfs = list_pdfs(dir)?;
    info!(
        "Batch: {} PDFs in {}, processing up to {}",
        pdfs.len(),
        dir.display(),
        max_papers
    );

    let started = Instant::now();
    let mut seen: HashSet<String> = HashSet::new();
    let mut first_with_hash: Vec<(String, String)> = Vec::new();
    let mut outcomes = Vec::new();

    for path in pdfs.iter().take(max_papers) {
        let id = paper_id(path);
        let hash = match content_hash(path).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                outcomes.push(BatchOutcome::Failed {
                    paper_id: id,
                    error: e.to_string(),
                });
                continue;
            }
        };
        if !seen.insert(hash.clone()) {
            let same_as = first_with_hash
                .iter()
                .find(|(h, _)| *h == hash)
                .map(|(_, id)| id.clone())
                .unwrap_or_default();
            info!("Skipping {}: same content as {}", id, same_as);
            outcomes.push(BatchOutcome::Duplicate { paper_id: id, same_as });
            continue;
        }
        first_with_hash.push((hash, id.clone()));

        match processor.process(path).await {
            Ok(summary) => outcomes.push(BatchOutcome::Processed(Box::new(summary))),
            Err(e) => {
                warn!("Processing failed for {}: {}", id, e);
                outcomes.push(BatchOutcome::Failed {
                    paper_id: id,
                    error: e.to_string(),
                });
            }
        }
    }

    let report = BatchReport {
        outcomes,
        elapsed: started.elapsed(),
        report_path: processor.output_dir().join(REPORT_FILE),
    };
    let text = report.render(processor);
    tokio::fs::create_dir_all(processor.output_dir()).await?;
    tokio::fs::write(&report.report_path, &text).await?;
    info!("{}", text);
    info!("Report saved to {}", report.report_path.display());
    Ok(report)
}
