//! JSONL dataset files and the generation report.

use std::fmt::Write as _;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use paperlens_core::{Document, Result};
use paperlens_ingest::Chunker;
use serde::Serialize;
use tracing::info;

use crate::examples::{classification_examples, long_form_examples, short_form_examples};

pub const DATA_FILE: &str = "training_data.jsonl";
pub const REPORT_FILE: &str = "dataset_report.txt";

/// One written dataset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFile {
    pub name: &'static str,
    pub path: PathBuf,
    pub examples: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DatasetReport {
    pub papers: usize,
    pub files: Vec<DatasetFile>,
    pub report_path: PathBuf,
}

impl DatasetReport {
    pub fn total_examples(&self) -> usize {
        self.files.iter().map(|f| f.examples).sum()
    }

    pub fn render(&self, output_dir: &Path) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "DATASET GENERATION REPORT");
        let _ = writeln!(out, "{}", "=".repeat(50));
        let _ = writeln!(out);
        let _ = writeln!(out, "Papers: {}", self.papers);
        let _ = writeln!(out);
        for file in &self.files {
            let _ = writeln!(out, "{}:", file.name.to_uppercase());
            let _ = writeln!(out, "   File: {}", file.path.display());
            let _ = writeln!(out, "   Examples: {}", file.examples);
            let _ = writeln!(out, "   Size: {:.1} KB", file.bytes as f64 / 1024.0);
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "TOTAL TRAINING EXAMPLES: {}", self.total_examples());
        let _ = writeln!(out, "Output directory: {}", output_dir.display());
        out
    }
}

/// Writes one JSONL file per consumer under an output directory.
pub struct DatasetWriter {
    output_dir: PathBuf,
}

impl DatasetWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_jsonl<T: Serialize>(&self, name: &'static str, items: &[T]) -> Result<DatasetFile> {
        let dir = self.output_dir.join(name);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(DATA_FILE);

        let mut out = BufWriter::new(std::fs::File::create(&path)?);
        for item in items {
            serde_json::to_writer(&mut out, item)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        drop(out);

        let bytes = std::fs::metadata(&path)?.len();
        info!("{} dataset: {} examples saved to {}", name, items.len(), path.display());
        Ok(DatasetFile {
            name,
            path,
            examples: items.len(),
            bytes,
        })
    }

    /// Build every dataset from `docs` and write files plus the report.
    pub fn write_all(&self, docs: &[Document], chunker: &Chunker) -> Result<DatasetReport> {
        let short_form = short_form_examples(docs, chunker);
        let long_form = long_form_examples(docs);
        let classification = classification_examples(docs);

        let files = vec![
            self.write_jsonl("short_form", &short_form)?,
            self.write_jsonl("long_form", &long_form)?,
            self.write_jsonl("classification", &classification)?,
        ];

        let report = DatasetReport {
            papers: docs.len(),
            files,
            report_path: self.output_dir.join(REPORT_FILE),
        };
        std::fs::write(&report.report_path, report.render(&self.output_dir))?;
        info!(
            "Dataset report: {} examples from {} papers, saved to {}",
            report.total_examples(),
            report.papers,
            report.report_path.display()
        );
        Ok(report)
    }
}
