//! Metadata persistence.

use std::io::{BufWriter, Write};
use std::path::Path;

use paperlens_core::{PaperMetadata, Result};
use tracing::info;

/// Write metadata as one pretty-printed JSON array.
pub fn save_metadata_json(papers: &[PaperMetadata], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(papers)?;
    std::fs::write(path, json)?;
    info!("Saved metadata for {} papers to {}", papers.len(), path.display());
    Ok(())
}

/// Write metadata as line-delimited JSON, one paper per line.
pub fn save_metadata_jsonl(papers: &[PaperMetadata], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(std::fs::File::create(path)?);
    for paper in papers {
        serde_json::to_writer(&mut out, paper)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    info!("Saved {} metadata lines to {}", papers.len(), path.display());
    Ok(())
}
