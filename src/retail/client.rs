//! HTTP client for retailer pages using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::error::ScrapeError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Trait for fetching retailer pages - enables mocking for tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a page and returns its HTML body.
    async fn get(&self, url: &str) -> Result<String>;
}

/// Retailer HTTP client with browser impersonation and politeness delay.
pub struct RetailClient {
    client: Client,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl RetailClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self { client, delay_ms: config.delay_ms, delay_jitter_ms: config.delay_jitter_ms })
    }

    /// Adds a random delay between requests.
    async fn delay(&self) {
        if self.delay_ms == 0 && self.delay_jitter_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

#[async_trait]
impl PageFetcher for RetailClient {
    async fn get(&self, url: &str) -> Result<String> {
        self.delay().await;

        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "pt-PT,pt;q=0.9,en;q=0.8")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 429 || status == 503 {
            warn!("Throttled ({}) by {}. Consider increasing --delay.", status, url);
        }

        if !status.is_success() {
            return Err(ScrapeError::Status { status: status.as_u16(), url: url.to_string() }.into());
        }

        response.text().await.context("Failed to read response body")
    }
}
