//! Offline subcommands: collect, batch, prepare, health.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use paperlens_collect::{save_metadata_json, save_metadata_jsonl, ArxivClient, DEFAULT_CATEGORIES};
use paperlens_core::{Capabilities, PaperLensConfig};
use paperlens_dataset::DatasetWriter;
use paperlens_ingest::{Chunker, LopdfExtractor};
use paperlens_runtime::process_directory;
use paperlens_structure::{GrobidClient, HybridStructurer, StructuringService};
use paperlens_summarize::Summarizer;
use tracing::{info, warn};

use crate::state::{build_processor, detect_components};

/// Positional argument `index`, parsed, or `default` when absent.
pub fn arg_or<T: std::str::FromStr>(args: &[String], index: usize, default: T) -> anyhow::Result<T> {
    match args.get(index) {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid argument '{}'", raw)),
        None => Ok(default),
    }
}

/// Comma-separated categories, or the defaults when empty.
pub fn parse_categories(raw: Option<&str>) -> Vec<String> {
    let parsed: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if parsed.is_empty() {
        DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
    } else {
        parsed
    }
}

/// `paperlens collect [categories] [max] [downloads]`
pub async fn collect(config: &PaperLensConfig, args: &[String]) -> anyhow::Result<()> {
    let categories = parse_categories(args.first().map(String::as_str));
    let max_results: usize = arg_or(args, 1, 150)?;
    let max_downloads: usize = arg_or(args, 2, 20)?;

    let client = ArxivClient::new(&config.collector)?;
    let papers = client.search(&categories, max_results, 0).await;
    info!("Collected {} papers from {:?}", papers.len(), categories);
    if papers.is_empty() {
        warn!("No papers collected");
        return Ok(());
    }

    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let dir = &config.data_paths.arxiv;
    let json_path = dir.join(format!("arxiv_papers_{}.json", stamp));
    let jsonl_path = dir.join(format!("arxiv_papers_{}.jsonl", stamp));
    save_metadata_json(&papers, &json_path)?;
    save_metadata_jsonl(&papers, &jsonl_path)?;
    info!("Saved metadata to {} and {}", json_path.display(), jsonl_path.display());

    let downloaded = client
        .download_pdfs(&papers, &config.data_paths.pdfs, max_downloads)
        .await?;
    info!(
        "{} PDFs available in {}",
        downloaded.len(),
        config.data_paths.pdfs.display()
    );
    Ok(())
}

/// `paperlens batch <pdf-dir> [max]`
pub async fn batch(config: &PaperLensConfig, args: &[String]) -> anyhow::Result<()> {
    let dir = pdf_dir(config, args);
    let max_papers: usize = arg_or(args, 1, usize::MAX)?;

    let (service, summarizer, capabilities) = detect_components(config).await;
    let processor = build_processor(config, capabilities, service, summarizer);
    let report = process_directory(&processor, &dir, max_papers).await?;

    let failed = report.failed().count();
    println!(
        "Processed {} of {} papers ({} failed). Report: {}",
        report.processed().count(),
        report.outcomes.len(),
        failed,
        report.report_path.display()
    );
    Ok(())
}

/// `paperlens prepare <pdf-dir>`
pub async fn prepare(config: &PaperLensConfig, args: &[String]) -> anyhow::Result<()> {
    let dir = pdf_dir(config, args);
    let grobid = GrobidClient::new(&config.structuring);
    let capabilities = Capabilities::new(grobid.is_alive().await, false);
    let structurer = HybridStructurer::new(
        Arc::new(grobid),
        Arc::new(LopdfExtractor),
        config.structuring.tiers.clone(),
        &capabilities,
    )
    .with_raw_xml_dir(&config.data_paths.raw_xml);

    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_pdf(path))
        .collect();
    pdfs.sort();
    info!("Preparing datasets from {} PDFs in {}", pdfs.len(), dir.display());

    let mut docs = Vec::with_capacity(pdfs.len());
    for path in &pdfs {
        match structurer.structure(path).await {
            Ok(doc) => docs.push(doc),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    let writer = DatasetWriter::new(&config.data_paths.training);
    let report = writer.write_all(&docs, &Chunker::new(config.chunking))?;
    print!("{}", report.render(writer.output_dir()));
    Ok(())
}

/// `paperlens health`
pub async fn health(config: &PaperLensConfig) -> anyhow::Result<bool> {
    let (_, summarizer, capabilities) = detect_components(config).await;
    println!("Structuring service ({}): {}", config.structuring.base_url, up(capabilities.structuring_service));
    println!(
        "Summarizer: {}",
        summarizer.model_name().unwrap_or_else(|| "unavailable".into())
    );
    println!("Local extraction: {}", up(capabilities.local_extraction));
    println!("Extraction route: {}", capabilities.extraction_route());
    Ok(capabilities.structuring_service)
}

fn up(flag: bool) -> &'static str {
    if flag {
        "available"
    } else {
        "unavailable"
    }
}

fn pdf_dir(config: &PaperLensConfig, args: &[String]) -> PathBuf {
    args.first()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data_paths.pdfs.clone())
}

fn is_pdf(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}
