//! Shared application state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use paperlens_core::{Capabilities, PaperLensConfig};
use paperlens_ingest::{Chunker, LopdfExtractor};
use paperlens_runtime::{PaperProcessor, TaskOrchestrator};
use paperlens_structure::{GrobidClient, HybridStructurer, StructuringService};
use paperlens_summarize::{LLMConfig, LlmSummarizer, NoopSummarizer, Summarizer};
use tracing::{info, warn};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: PaperLensConfig,
    pub capabilities: Capabilities,
    pub orchestrator: TaskOrchestrator,
    pub model: Option<String>,
    started: Instant,
}

impl AppState {
    pub fn new(
        config: PaperLensConfig,
        capabilities: Capabilities,
        service: Arc<dyn StructuringService>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        let processor = Arc::new(build_processor(&config, capabilities, service, summarizer.clone()));
        let orchestrator = TaskOrchestrator::new(
            processor,
            &config.data_paths.uploads,
            config.max_upload_bytes,
        );
        Self {
            model: summarizer.model_name(),
            capabilities,
            orchestrator,
            config,
            started: Instant::now(),
        }
    }

    /// Probe the structuring service and resolve a summarizer, then build state.
    pub async fn detect(config: PaperLensConfig) -> Self {
        let (service, summarizer, capabilities) = detect_components(&config).await;
        Self::new(config, capabilities, service, summarizer)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// One health check plus provider resolution, done once at startup.
pub async fn detect_components(
    config: &PaperLensConfig,
) -> (Arc<dyn StructuringService>, Arc<dyn Summarizer>, Capabilities) {
    let grobid = GrobidClient::new(&config.structuring);
    let alive = grobid.is_alive().await;
    if alive {
        info!("GROBID available at {}", grobid.base_url());
    } else {
        warn!(
            "GROBID not reachable at {}, using local extraction only",
            grobid.base_url()
        );
    }

    let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);
    let timeout = Duration::from_secs(config.summary_timeout_secs);
    let summarizer: Arc<dyn Summarizer> = match LlmSummarizer::from_config(&llm_config, timeout) {
        Some(llm) => Arc::new(llm),
        None => {
            warn!("No LLM provider configured, summaries fall back to the abstract");
            Arc::new(NoopSummarizer)
        }
    };

    let capabilities = Capabilities::new(alive, summarizer.is_available());
    let service: Arc<dyn StructuringService> = Arc::new(grobid);
    (service, summarizer, capabilities)
}

pub fn build_processor(
    config: &PaperLensConfig,
    capabilities: Capabilities,
    service: Arc<dyn StructuringService>,
    summarizer: Arc<dyn Summarizer>,
) -> PaperProcessor {
    let structurer = HybridStructurer::new(
        service,
        Arc::new(LopdfExtractor),
        config.structuring.tiers.clone(),
        &capabilities,
    )
    .with_raw_xml_dir(&config.data_paths.raw_xml);
    PaperProcessor::new(
        structurer,
        summarizer,
        Chunker::new(config.chunking),
        capabilities,
        &config.data_paths.outputs,
    )
}
