//! Compare command: cross-retailer comparison of the persisted stores.

use crate::compare::Comparator;
use crate::config::Config;
use crate::format::Formatter;
use anyhow::Result;
use tracing::info;

/// Compares the latest prices of products sold by two or more retailers.
pub struct CompareCommand {
    config: Config,
}

impl CompareCommand {
    /// Creates a new compare command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Loads every configured store and returns the formatted comparison.
    pub fn execute(&self) -> Result<String> {
        info!("Comparing stores in {}", self.config.output_dir.display());

        let comparator = Comparator::load(&self.config.output_dir, &self.config.retailers)?;
        let comparisons = comparator.compare();
        let retailers: Vec<&str> = comparator.retailers().collect();

        Ok(Formatter::new(self.config.format).format_comparisons(&retailers, &comparisons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::retail::profile::{auchan, continente};
    use crate::store::JsonStore;
    use tempfile::TempDir;

    fn write_store(dir: &TempDir, data_file: &str, json: &str) {
        std::fs::write(dir.path().join(data_file), json).unwrap();
    }

    fn make_config(dir: &TempDir, format: OutputFormat) -> Config {
        Config { output_dir: dir.path().to_path_buf(), format, ..Config::default() }
    }

    #[test]
    fn test_compare_command_csv() {
        let dir = TempDir::new().unwrap();
        write_store(
            &dir,
            &continente().data_file,
            r#"{"1234567890123": {"name": "Test Wine", "brand": "B", "quantity": "75cl",
                "price_history": [{"price": "9.99", "timestamp": "2026-10-01T08:00:00Z"}]}}"#,
        );
        write_store(
            &dir,
            &auchan().data_file,
            r#"{"1234567890123": {"name": "Test Wine", "brand": "B", "quantity": "75cl",
                "price_history": [{"price": 8.99, "timestamp": "2026-10-01T09:00:00"}]}}"#,
        );

        let output = CompareCommand::new(make_config(&dir, OutputFormat::Csv)).execute().unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1234567890123,Test Wine,continente,9.99,,1.00,"));
        assert!(lines[2].ends_with(",true"));
    }

    #[test]
    fn test_compare_command_no_data() {
        let dir = TempDir::new().unwrap();
        let output = CompareCommand::new(make_config(&dir, OutputFormat::Table)).execute().unwrap();
        assert_eq!(output, "No products found at two or more retailers.");
    }

    #[test]
    fn test_compare_command_needs_two_retailers() {
        let dir = TempDir::new().unwrap();
        let config = Config { retailers: vec![auchan()], ..make_config(&dir, OutputFormat::Table) };

        let err = CompareCommand::new(config).execute().unwrap_err();
        assert!(err.to_string().contains("At least two retailers"));
    }

    #[test]
    fn test_compare_command_corrupt_store() {
        let dir = TempDir::new().unwrap();
        write_store(&dir, &continente().data_file, "[1, 2");
        JsonStore::in_dir(dir.path(), &auchan().data_file).save(&Default::default()).unwrap();

        let err = CompareCommand::new(make_config(&dir, OutputFormat::Json)).execute().unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load Continente store"));
    }
}
