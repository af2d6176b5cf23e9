//! Scrape command: fetch every selected retailer and merge into its store.

use crate::config::Config;
use crate::format::Formatter;
use crate::retail::{PageFetcher, RetailClient, RetailerProfile, SiteScraper};
use crate::store::{JsonStore, MergeSummary};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

/// Outcome of scraping one retailer.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub retailer: String,
    /// Products returned by the scraper
    pub fetched: usize,
    pub summary: MergeSummary,
    /// Entries in the store after merging
    pub store_size: usize,
    pub data_file: PathBuf,
    /// Set when the retailer failed; its store is left untouched
    pub error: Option<String>,
}

impl ScrapeReport {
    /// Returns true if the retailer was scraped and saved.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Short status label.
    pub fn status(&self) -> String {
        match &self.error {
            None => "ok".to_string(),
            Some(e) => format!("failed: {}", e),
        }
    }
}

/// Scrapes the selected retailers one after another.
pub struct ScrapeCommand {
    config: Config,
    retailers: Vec<RetailerProfile>,
}

impl ScrapeCommand {
    /// Creates a scrape command for `retailers`.
    pub fn new(config: Config, retailers: Vec<RetailerProfile>) -> Self {
        Self { config, retailers }
    }

    /// Runs the scrape with a real HTTP client and returns formatted output.
    pub async fn execute(&self) -> Result<String> {
        let client = RetailClient::new(&self.config).context("Failed to create HTTP client")?;
        self.execute_with_fetcher(&client).await
    }

    /// Runs the scrape with a provided fetcher (for testing).
    pub async fn execute_with_fetcher(&self, fetcher: &impl PageFetcher) -> Result<String> {
        let reports = self.run(fetcher).await?;
        Ok(Formatter::new(self.config.format).format_reports(&reports))
    }

    /// Scrapes every retailer, isolating failures per retailer.
    ///
    /// Fails only when every retailer failed.
    pub async fn run(&self, fetcher: &impl PageFetcher) -> Result<Vec<ScrapeReport>> {
        let reports = self.scrape_all(fetcher).await;

        if all_failed(&reports) {
            anyhow::bail!("All retailers failed to scrape");
        }

        Ok(reports)
    }

    /// Scrapes every retailer and reports each outcome, failed ones included.
    pub async fn scrape_all(&self, fetcher: &impl PageFetcher) -> Vec<ScrapeReport> {
        let mut reports = Vec::with_capacity(self.retailers.len());

        for profile in &self.retailers {
            let store = JsonStore::in_dir(&self.config.output_dir, &profile.data_file);
            info!("Scraping {}", profile.display_name);

            let report = match self.scrape_one(profile, &store, fetcher).await {
                Ok((fetched, summary, store_size)) => {
                    info!(
                        "{}: {} fetched, {} new, {} price changes",
                        profile.display_name, fetched, summary.inserted, summary.price_changes
                    );
                    ScrapeReport {
                        retailer: profile.name.clone(),
                        fetched,
                        summary,
                        store_size,
                        data_file: store.path().to_path_buf(),
                        error: None,
                    }
                }
                Err(e) => {
                    error!("{} failed: {:#}", profile.display_name, e);
                    ScrapeReport {
                        retailer: profile.name.clone(),
                        fetched: 0,
                        summary: MergeSummary::default(),
                        store_size: 0,
                        data_file: store.path().to_path_buf(),
                        error: Some(format!("{:#}", e)),
                    }
                }
            };
            reports.push(report);
        }

        reports
    }

    async fn scrape_one(
        &self,
        profile: &RetailerProfile,
        store: &JsonStore,
        fetcher: &impl PageFetcher,
    ) -> Result<(usize, MergeSummary, usize)> {
        // Load first so a corrupt store fails before any request is sent
        let mut prices = store.load()?;

        let scraper =
            SiteScraper::new(profile.clone(), fetcher)?.with_max_pages(self.config.max_pages);
        let records = scraper.fetch_all(self.config.product_limit).await?;

        let summary = prices.merge(&records);
        store.save(&prices)?;

        Ok((records.len(), summary, prices.len()))
    }
}

/// Returns true if there was at least one retailer and none succeeded.
pub fn all_failed(reports: &[ScrapeReport]) -> bool {
    !reports.is_empty() && reports.iter().all(|r| !r.is_ok())
}
