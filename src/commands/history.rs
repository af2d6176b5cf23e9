//! History command: every recorded price of one EAN.

use crate::compare::Comparator;
use crate::config::Config;
use crate::format::Formatter;
use anyhow::Result;

/// Shows the price history of a product across retailers.
pub struct HistoryCommand {
    config: Config,
}

impl HistoryCommand {
    /// Creates a new history command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Returns the formatted history of `ean`.
    pub fn execute(&self, ean: &str) -> Result<String> {
        let ean = ean.trim();
        if ean.is_empty() {
            anyhow::bail!("EAN must not be empty");
        }

        let comparator = Comparator::load(&self.config.output_dir, &self.config.retailers)?;
        let histories = comparator.price_history(ean);

        Ok(Formatter::new(self.config.format).format_history(ean, &histories))
    }
}
