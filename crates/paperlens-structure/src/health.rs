//! Readiness probe for the structuring service.

use std::time::Duration;

use paperlens_core::HealthCheckConfig;
use reqwest::Client;
use tracing::{debug, error, info, warn};

/// One GET against one path variant.
async fn probe(client: &Client, url: &str, timeout: Duration) -> bool {
    match client.get(url).timeout(timeout).send().await {
        Ok(resp) if resp.status().as_u16() == 200 => match resp.text().await {
            Ok(body) => body.to_lowercase().contains("true"),
            Err(e) => {
                debug!("Health body read failed for {}: {}", url, e);
                false
            }
        },
        Ok(resp) => {
            debug!("Health check {} returned {}", url, resp.status());
            false
        }
        Err(e) => {
            debug!("Health check {} failed: {}", url, e);
            false
        }
    }
}

/// Probe every path variant per attempt, waiting between attempts on the
/// configured schedule. False only after all attempts on all variants fail.
pub async fn wait_until_alive(client: &Client, base_url: &str, config: &HealthCheckConfig) -> bool {
    let base = base_url.trim_end_matches('/');
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let attempts = config.attempts();

    for (attempt, delay) in config.delays_secs.iter().enumerate() {
        for path in &config.paths {
            let url = format!("{}{}", base, path);
            if probe(client, &url, timeout).await {
                info!("Structuring service is healthy ({})", path);
                return true;
            }
        }

        warn!(
            "Structuring service attempt {}/{} failed",
            attempt + 1,
            attempts
        );
        if attempt + 1 < attempts {
            debug!("Waiting {}s before retry", delay);
            tokio::time::sleep(Duration::from_secs(*delay)).await;
        }
    }

    error!("Structuring service unreachable after {} attempts", attempts);
    false
}
