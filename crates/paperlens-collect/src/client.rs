//! arXiv query client.
//!
//! One `cat:<category>` query per category, newest submissions first,
//! paginated `page_size` results at a time with a polite delay between
//! requests.

use std::time::Duration;

use paperlens_core::{CollectorConfig, Error, PaperMetadata, Result};
use reqwest::Client;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::feed::parse_feed;

/// Map a reqwest failure onto the error kinds callers branch on.
pub(crate) fn map_reqwest(e: reqwest::Error, context: &str, timeout: Duration) -> Error {
    if e.is_timeout() {
        Error::Timeout {
            context: context.to_string(),
            secs: timeout.as_secs(),
        }
    } else if e.is_connect() {
        Error::Connectivity(format!("{}: {}", context, e))
    } else {
        Error::Http(format!("{}: {}", context, e))
    }
}

pub struct ArxivClient {
    pub(crate) client: Client,
    pub(crate) config: CollectorConfig,
}

impl ArxivClient {
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(concat!("paperlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.http_timeout_secs)
    }

    /// Fetch one page of results for a category.
    pub async fn fetch_page(
        &self,
        category: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<PaperMetadata>> {
        debug!("Query cat:{} start={} max_results={}", category, start, count);
        let query = format!("cat:{}", category);
        let start = start.to_string();
        let count = count.to_string();
        let response = self
            .client
            .get(&self.config.api_url)
            .query(&[
                ("search_query", query.as_str()),
                ("start", start.as_str()),
                ("max_results", count.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await
            .map_err(|e| map_reqwest(e, &self.config.api_url, self.timeout()))?;

        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "arXiv query for {} returned {}",
                category,
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest(e, &self.config.api_url, self.timeout()))?;
        parse_feed(&body, category)
    }

    /// Pages of results for one category, up to `max_results` papers.
    ///
    /// Ends after a short or empty page, or after yielding the first error.
    pub fn search_stream<'a>(
        &'a self,
        category: &'a str,
        start: usize,
        max_results: usize,
    ) -> impl Stream<Item = Result<Vec<PaperMetadata>>> + Send + 'a {
        let delay = Duration::from_secs(self.config.request_delay_secs);
        let page_size = self.config.page_size.max(1);

        async_stream::stream! {
            let mut offset = start;
            let mut fetched = 0usize;

            while fetched < max_results {
                if fetched > 0 {
                    tokio::time::sleep(delay).await;
                }
                let count = page_size.min(max_results - fetched);
                let page = match self.fetch_page(category, offset, count).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                if page.is_empty() {
                    info!("No more results for {} at offset {}", category, offset);
                    return;
                }
                let received = page.len();
                fetched += received;
                offset += received;
                yield Ok(page);

                if received < count {
                    return;
                }
            }
        }
    }

    /// Search every category, splitting `max_results` evenly between them.
    /// A failing category is logged and skipped.
    pub async fn search(
        &self,
        categories: &[String],
        max_results: usize,
        start: usize,
    ) -> Vec<PaperMetadata> {
        if categories.is_empty() {
            return Vec::new();
        }
        let per_category = max_results / categories.len();
        let delay = Duration::from_secs(self.config.request_delay_secs);
        let mut papers = Vec::new();

        for (i, category) in categories.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(delay).await;
            }
            info!("Searching category: {} (up to {})", category, per_category);

            let stream = self.search_stream(category, start, per_category);
            tokio::pin!(stream);
            let mut found = 0usize;
            while let Some(page) = stream.next().await {
                match page {
                    Ok(page) => {
                        found += page.len();
                        papers.extend(page);
                    }
                    Err(e) => {
                        warn!("Error fetching {}: {}", category, e);
                        break;
                    }
                }
            }
            info!("Found {} papers in {}", found, category);
        }

        papers
    }
}
