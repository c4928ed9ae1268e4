//! PDF download with skip-existing and rate limiting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use paperlens_core::{Error, PaperMetadata, Result};
use tokio::io::AsyncWriteExt;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::client::{map_reqwest, ArxivClient};

/// File name for a paper's PDF; old-style ids contain a slash.
pub fn pdf_file_name(paper_id: &str) -> String {
    format!("{}.pdf", paper_id.replace('/', "_"))
}

impl ArxivClient {
    /// Download up to `max_downloads` PDFs into `dir`.
    ///
    /// Papers without a PDF link are skipped. Files already on disk are
    /// returned without a request. Failures are logged and skipped.
    pub async fn download_pdfs(
        &self,
        papers: &[PaperMetadata],
        dir: &Path,
        max_downloads: usize,
    ) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir).await?;
        let delay = Duration::from_secs(self.config.download_delay_secs);
        let candidates = &papers[..papers.len().min(max_downloads)];
        let mut downloaded = Vec::new();

        for (i, paper) in candidates.iter().enumerate() {
            let Some(url) = paper.pdf_url.as_deref() else {
                continue;
            };
            let path = dir.join(pdf_file_name(&paper.paper_id));
            if path.exists() {
                downloaded.push(path);
                continue;
            }

            info!(
                "Downloading {}/{}: {}",
                i + 1,
                candidates.len(),
                path.display()
            );
            match self.download_one(url, &path).await {
                Ok(bytes) => {
                    info!("Saved {} ({} bytes)", path.display(), bytes);
                    downloaded.push(path);
                }
                Err(e) => warn!("Error downloading {}: {}", paper.paper_id, e),
            }

            tokio::time::sleep(delay).await;
        }

        Ok(downloaded)
    }

    /// Stream one body to `<path>.part`, then move it into place.
    async fn download_one(&self, url: &str, path: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest(e, url, self.timeout()))?;
        if !response.status().is_success() {
            return Err(Error::Http(format!("{} returned {}", url, response.status())));
        }

        let partial = path.with_extension("pdf.part");
        let result = async {
            let mut file = tokio::fs::File::create(&partial).await?;
            let mut body = response.bytes_stream();
            let mut written = 0u64;
            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(|e| map_reqwest(e, url, self.timeout()))?;
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok::<u64, Error>(written)
        }
        .await;

        match result {
            Ok(written) => {
                tokio::fs::rename(&partial, path).await?;
                Ok(written)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }
}
