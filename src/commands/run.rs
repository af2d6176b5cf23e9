//! Run command: scrape every retailer, then compare whatever is on disk.

use super::{scrape, CompareCommand, ScrapeCommand};
use crate::config::Config;
use crate::format::Formatter;
use crate::retail::{PageFetcher, RetailClient};
use anyhow::{Context, Result};
use tracing::{error, warn};

/// Combined result of a scrape followed by a comparison.
#[derive(Debug)]
pub struct RunOutcome {
    /// Scrape reports, then the comparison when it succeeded
    pub output: String,
    /// Every retailer failed to scrape
    pub scrape_failed: bool,
    pub compare_error: Option<anyhow::Error>,
}

impl RunOutcome {
    /// Fails if either step failed.
    pub fn status(self) -> Result<()> {
        if let Some(e) = self.compare_error {
            return Err(e);
        }
        if self.scrape_failed {
            anyhow::bail!("All retailers failed to scrape");
        }
        Ok(())
    }
}

/// Scrapes every configured retailer and compares the resulting stores.
pub struct RunCommand {
    config: Config,
}

impl RunCommand {
    /// Creates a new run command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs with a real HTTP client.
    pub async fn execute(&self) -> Result<RunOutcome> {
        let client = RetailClient::new(&self.config).context("Failed to create HTTP client")?;
        Ok(self.execute_with_fetcher(&client).await)
    }

    /// Runs with a provided fetcher (for testing).
    ///
    /// The comparison runs even when every retailer failed, over the stores
    /// already on disk.
    pub async fn execute_with_fetcher(&self, fetcher: &impl PageFetcher) -> RunOutcome {
        let cmd = ScrapeCommand::new(self.config.clone(), self.config.retailers.clone());
        let reports = cmd.scrape_all(fetcher).await;

        let scrape_failed = scrape::all_failed(&reports);
        if scrape_failed {
            warn!("All retailers failed to scrape, comparing stored prices");
        }

        let mut output = Formatter::new(self.config.format).format_reports(&reports);

        let compare_error = match CompareCommand::new(self.config.clone()).execute() {
            Ok(comparison) => {
                output.push_str("\n\n");
                output.push_str(&comparison);
                None
            }
            Err(e) => {
                error!("Comparison failed: {:#}", e);
                Some(e)
            }
        };

        RunOutcome { output, scrape_failed, compare_error }
    }
}
