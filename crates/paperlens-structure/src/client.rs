//! GROBID HTTP client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use paperlens_core::{Error, HealthCheckConfig, Result, StructuringConfig};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, info};

use crate::health::wait_until_alive;

const FULLTEXT_PATH: &str = "/api/processFulltextDocument";

/// External document-structuring service.
#[async_trait]
pub trait StructuringService: Send + Sync {
    /// Readiness signal, with retries.
    async fn is_alive(&self) -> bool;

    /// Submit a PDF and return the TEI XML response.
    async fn structure(&self, path: &Path, timeout: Duration) -> Result<String>;
}

/// Client for a GROBID server.
#[derive(Clone)]
pub struct GrobidClient {
    http: Client,
    base_url: String,
    health: HealthCheckConfig,
}

impl GrobidClient {
    pub fn new(config: &StructuringConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            health: config.health.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn map_send_error(e: reqwest::Error, url: &str, timeout: Duration) -> Error {
    if e.is_timeout() {
        Error::Timeout {
            context: format!("POST {}", url),
            secs: timeout.as_secs(),
        }
    } else if e.is_connect() {
        Error::Connectivity(format!("{}: {}", url, e))
    } else {
        Error::Http(format!("{}: {}", url, e))
    }
}

#[async_trait]
impl StructuringService for GrobidClient {
    async fn is_alive(&self) -> bool {
        wait_until_alive(&self.http, &self.base_url, &self.health).await
    }

    async fn structure(&self, path: &Path, timeout: Duration) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        let size = bytes.len();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| Error::Http(e.to_string()))?;
        let form = Form::new()
            .part("input", part)
            .text("consolidateHeader", "1")
            .text("consolidateCitations", "1")
            .text("generateIDs", "1");

        let url = format!("{}{}", self.base_url, FULLTEXT_PATH);
        info!(
            "Sending {} ({} bytes) to GROBID, timeout {}s",
            path.display(),
            size,
            timeout.as_secs()
        );

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(e, &url, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http(format!(
                "GROBID returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let xml = response
            .text()
            .await
            .map_err(|e| map_send_error(e, &url, timeout))?;
        debug!("GROBID returned {} chars of TEI", xml.len());
        Ok(xml)
    }
}
