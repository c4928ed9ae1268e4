//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::document::Consumer;

/// Paths to all PaperLens data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Uploaded PDFs awaiting processing (`data/uploads/`).
    pub uploads: PathBuf,
    /// Per-paper summary JSON and batch reports (`data/outputs/`).
    pub outputs: PathBuf,
    /// Raw TEI responses, one per structuring call (`data/outputs/raw_xml/`).
    pub raw_xml: PathBuf,
    /// Collected metadata (`data/datasets/arxiv/`).
    pub arxiv: PathBuf,
    /// Downloaded PDFs (`data/datasets/arxiv/pdfs/`).
    pub pdfs: PathBuf,
    /// Prepared training sets (`data/training/`).
    pub training: PathBuf,
    /// Summarizer provider configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let outputs = root.join("outputs");
        let arxiv = root.join("datasets").join("arxiv");
        let paths = Self {
            uploads: root.join("uploads"),
            raw_xml: outputs.join("raw_xml"),
            pdfs: arxiv.join("pdfs"),
            training: root.join("training"),
            llm_config_file: root.join("llm-config.json"),
            outputs,
            arxiv,
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    /// Create all required directories.
    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.uploads)?;
        std::fs::create_dir_all(&self.raw_xml)?;
        std::fs::create_dir_all(&self.pdfs)?;
        std::fs::create_dir_all(&self.training)?;
        Ok(())
    }
}

/// Named timeout budget for one structuring attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutTier {
    Quick,
    Normal,
    Extended,
    Maximum,
}

impl TimeoutTier {
    pub const ALL: [TimeoutTier; 4] = [Self::Quick, Self::Normal, Self::Extended, Self::Maximum];

    /// Next-larger tier, `None` at the top.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Quick => Some(Self::Normal),
            Self::Normal => Some(Self::Extended),
            Self::Extended => Some(Self::Maximum),
            Self::Maximum => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Normal => "normal",
            Self::Extended => "extended",
            Self::Maximum => "maximum",
        }
    }
}

impl std::fmt::Display for TimeoutTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const MB: u64 = 1024 * 1024;

/// Second-budgets per tier plus an optional global cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierBudgets {
    pub quick_secs: u64,
    pub normal_secs: u64,
    pub extended_secs: u64,
    pub maximum_secs: u64,
    /// Applied to every tier when set.
    pub cap_secs: Option<u64>,
}

impl Default for TierBudgets {
    fn default() -> Self {
        Self {
            quick_secs: 60,
            normal_secs: 300,
            extended_secs: 600,
            maximum_secs: 900,
            cap_secs: None,
        }
    }
}

impl TierBudgets {
    /// Pick the starting tier from the file size.
    pub fn estimate(file_size: u64) -> TimeoutTier {
        if file_size < MB {
            TimeoutTier::Quick
        } else if file_size < 5 * MB {
            TimeoutTier::Normal
        } else if file_size < 15 * MB {
            TimeoutTier::Extended
        } else {
            TimeoutTier::Maximum
        }
    }

    /// Tiers to try, in order, starting at `tier`. Never more than two.
    pub fn escalation(tier: TimeoutTier) -> Vec<TimeoutTier> {
        match tier.next() {
            Some(next) => vec![tier, next],
            None => vec![tier],
        }
    }

    /// Budget for a tier after applying the cap.
    pub fn budget(&self, tier: TimeoutTier) -> Duration {
        let secs = match tier {
            TimeoutTier::Quick => self.quick_secs,
            TimeoutTier::Normal => self.normal_secs,
            TimeoutTier::Extended => self.extended_secs,
            TimeoutTier::Maximum => self.maximum_secs,
        };
        let secs = match self.cap_secs {
            Some(cap) => secs.min(cap),
            None => secs,
        };
        Duration::from_secs(secs)
    }
}

/// Readiness probe schedule for the structuring service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    /// Wait after each failed attempt; its length is the attempt count.
    pub delays_secs: Vec<u64>,
    pub request_timeout_secs: u64,
    /// Path variants tried on every attempt.
    pub paths: Vec<String>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            delays_secs: vec![2, 5, 10, 15, 20],
            request_timeout_secs: 10,
            paths: vec!["/api/isalive".into(), "/api/isAlive".into()],
        }
    }
}

impl HealthCheckConfig {
    pub fn attempts(&self) -> usize {
        self.delays_secs.len()
    }
}

/// External structuring service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuringConfig {
    pub base_url: String,
    pub tiers: TierBudgets,
    pub health: HealthCheckConfig,
}

impl Default for StructuringConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8070".into(),
            tiers: TierBudgets::default(),
            health: HealthCheckConfig::default(),
        }
    }
}

/// Word budgets for one consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkBudget {
    pub target: usize,
    pub max: usize,
    pub min: usize,
}

impl ChunkBudget {
    pub const fn new(target: usize, max: usize, min: usize) -> Self {
        Self { target, max, min }
    }
}

/// Independently tunable budgets for both consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkBudgets {
    pub short_form: ChunkBudget,
    pub long_form: ChunkBudget,
}

impl Default for ChunkBudgets {
    fn default() -> Self {
        Self {
            short_form: ChunkBudget::new(350, 450, 100),
            long_form: ChunkBudget::new(1000, 1200, 300),
        }
    }
}

impl ChunkBudgets {
    pub fn for_consumer(&self, consumer: Consumer) -> ChunkBudget {
        match consumer {
            Consumer::ShortForm => self.short_form,
            Consumer::LongForm => self.long_form,
        }
    }
}

/// Metadata fetcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    pub api_url: String,
    /// Results requested per page.
    pub page_size: usize,
    pub request_delay_secs: u64,
    pub download_delay_secs: u64,
    pub http_timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            api_url: "http://export.arxiv.org/api/query".into(),
            page_size: 100,
            request_delay_secs: 3,
            download_delay_secs: 2,
            http_timeout_secs: 60,
        }
    }
}

/// Top-level PaperLens configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperLensConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    pub structuring: StructuringConfig,
    pub chunking: ChunkBudgets,
    pub collector: CollectorConfig,
    /// Upload ceiling in bytes.
    pub max_upload_bytes: u64,
    /// Wall-clock bound for synchronous processing.
    pub sync_process_timeout_secs: u64,
    /// Request timeout for summarization calls.
    pub summary_timeout_secs: u64,
}

impl PaperLensConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = env_or("PORT", 8000);
        let data_paths = DataPaths::new(data_dir)?;

        let mut structuring = StructuringConfig::default();
        if let Ok(url) = std::env::var("GROBID_URL") {
            structuring.base_url = url.trim_end_matches('/').to_string();
        }
        structuring.tiers.cap_secs = std::env::var("GROBID_TIMEOUT_CAP_SECS")
            .ok()
            .and_then(|v| v.parse().ok());

        let defaults = ChunkBudgets::default();
        let chunking = ChunkBudgets {
            short_form: ChunkBudget::new(
                env_or("SHORT_FORM_TARGET_WORDS", defaults.short_form.target),
                env_or("SHORT_FORM_MAX_WORDS", defaults.short_form.max),
                env_or("SHORT_FORM_MIN_WORDS", defaults.short_form.min),
            ),
            long_form: ChunkBudget::new(
                env_or("LONG_FORM_TARGET_WORDS", defaults.long_form.target),
                env_or("LONG_FORM_MAX_WORDS", defaults.long_form.max),
                env_or("LONG_FORM_MIN_WORDS", defaults.long_form.min),
            ),
        };

        let mut collector = CollectorConfig::default();
        if let Ok(url) = std::env::var("ARXIV_API_URL") {
            collector.api_url = url;
        }
        collector.request_delay_secs = env_or("ARXIV_REQUEST_DELAY_SECS", collector.request_delay_secs);
        collector.download_delay_secs =
            env_or("ARXIV_DOWNLOAD_DELAY_SECS", collector.download_delay_secs);
        collector.http_timeout_secs = env_or("HTTP_TIMEOUT_SECS", collector.http_timeout_secs);

        Ok(Self {
            port,
            data_paths,
            structuring,
            chunking,
            collector,
            max_upload_bytes: env_or::<u64>("MAX_UPLOAD_MB", 50) * MB,
            sync_process_timeout_secs: env_or("SYNC_PROCESS_TIMEOUT_SECS", 300),
            summary_timeout_secs: env_or("SUMMARY_TIMEOUT_SECS", 60),
        })
    }

    /// Defaults only, no environment lookups.
    pub fn with_defaults(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            port: 8000,
            data_paths: DataPaths::new(data_dir)?,
            structuring: StructuringConfig::default(),
            chunking: ChunkBudgets::default(),
            collector: CollectorConfig::default(),
            max_upload_bytes: 50 * MB,
            sync_process_timeout_secs: 300,
            summary_timeout_secs: 60,
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_creates_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(tmp.path()).unwrap();
        assert!(paths.uploads.is_dir());
        assert!(paths.raw_xml.is_dir());
        assert!(paths.pdfs.is_dir());
        assert!(paths.training.is_dir());
        assert!(paths.pdfs.starts_with(&paths.arxiv));
        assert!(!paths.llm_config_file.exists());
    }

    #[test]
    fn test_tier_estimate_boundaries() {
        assert_eq!(TierBudgets::estimate(0), TimeoutTier::Quick);
        assert_eq!(TierBudgets::estimate(MB - 1), TimeoutTier::Quick);
        assert_eq!(TierBudgets::estimate(MB), TimeoutTier::Normal);
        assert_eq!(TierBudgets::estimate(5 * MB), TimeoutTier::Extended);
        assert_eq!(TierBudgets::estimate(15 * MB), TimeoutTier::Maximum);
    }

    #[test]
    fn test_escalation_is_bounded() {
        assert_eq!(
            TierBudgets::escalation(TimeoutTier::Quick),
            vec![TimeoutTier::Quick, TimeoutTier::Normal]
        );
        assert_eq!(
            TierBudgets::escalation(TimeoutTier::Extended),
            vec![TimeoutTier::Extended, TimeoutTier::Maximum]
        );
        assert_eq!(
            TierBudgets::escalation(TimeoutTier::Maximum),
            vec![TimeoutTier::Maximum]
        );
    }

    #[test]
    fn test_budgets_increase_and_respect_cap() {
        let mut budgets = TierBudgets::default();
        let secs: Vec<u64> = TimeoutTier::ALL
            .iter()
            .map(|t| budgets.budget(*t).as_secs())
            .collect();
        assert!(secs.windows(2).all(|w| w[0] < w[1]));

        budgets.cap_secs = Some(5);
        assert_eq!(budgets.budget(TimeoutTier::Maximum), Duration::from_secs(5));
    }

    #[test]
    fn test_chunk_budget_lookup() {
        let budgets = ChunkBudgets::default();
        assert_eq!(budgets.for_consumer(Consumer::ShortForm).max, 450);
        assert_eq!(budgets.for_consumer(Consumer::LongForm).min, 300);
    }
}
