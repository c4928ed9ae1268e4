//! Runtime types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use paperlens_core::{ExtractionDetails, ExtractionMethod, SectionMap};
use paperlens_summarize::Summary;
use serde::{Deserialize, Serialize};

/// Task lifecycle: uploaded → processing → completed | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chunks produced per consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkCounts {
    pub short_form: usize,
    pub long_form: usize,
}

/// Result payload of one processed paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSummary {
    pub paper_id: String,
    /// SHA-256 of the PDF bytes.
    pub content_hash: String,
    pub title: String,
    pub authors: Vec<String>,
    pub method: ExtractionMethod,
    pub summary: Summary,
    pub sections_found: Vec<String>,
    pub sections: SectionMap,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub chunk_counts: ChunkCounts,
    pub extraction: ExtractionDetails,
    /// A summarization model was configured for this run.
    pub ai_enhanced: bool,
    pub processed_at: DateTime<Utc>,
}

/// One tracked processing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub filename: String,
    #[serde(skip)]
    pub file_path: PathBuf,
    pub status: TaskStatus,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PaperSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskRecord {
    pub fn new(task_id: impl Into<String>, filename: impl Into<String>, file_path: PathBuf) -> Self {
        Self {
            task_id: task_id.into(),
            filename: filename.into(),
            file_path,
            status: TaskStatus::Uploaded,
            uploaded_at: Utc::now(),
            started_at: None,
            completed_at: None,
            failed_at: None,
            result: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Uploaded.is_terminal());
    }

    #[test]
    fn test_new_record_hides_path_and_empty_fields() {
        let record = TaskRecord::new("t1", "paper.pdf", PathBuf::from("/tmp/t1.pdf"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "uploaded");
        assert_eq!(json["filename"], "paper.pdf");
        assert!(json.get("file_path").is_none());
        assert!(json.get("result").is_none());
        assert!(json.get("started_at").is_none());
    }
}
