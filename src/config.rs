//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::retail::profile::builtin;
use crate::retail::RetailerProfile;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one JSON store per retailer
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum products per retailer; unset means the listing's total count
    #[serde(default)]
    pub product_limit: Option<usize>,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay between requests in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on listing pages per retailer
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Retailer profiles, in comparison order
    #[serde(default = "builtin")]
    pub retailers: Vec<RetailerProfile>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_delay_ms() -> u64 {
    250
}

fn default_delay_jitter_ms() -> u64 {
    250
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_pages() -> usize {
    crate::retail::scraper::DEFAULT_MAX_PAGES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            product_limit: None,
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            timeout_secs: default_timeout_secs(),
            max_pages: default_max_pages(),
            format: OutputFormat::Table,
            retailers: builtin(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("wine-tracker").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides. Unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Ok(dir) = std::env::var("WINE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        if let Ok(proxy) = std::env::var("WINE_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("WINE_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        if let Ok(limit) = std::env::var("WINE_LIMIT") {
            if let Ok(l) = limit.parse() {
                self.product_limit = Some(l);
            }
        }

        self
    }

    /// Returns the configured profiles named in `names`, in configured order.
    ///
    /// An empty selection returns every profile.
    pub fn select_retailers(&self, names: &[String]) -> Result<Vec<RetailerProfile>> {
        for name in names {
            if !self.retailers.iter().any(|p| &p.name == name) {
                let known: Vec<&str> = self.retailers.iter().map(|p| p.name.as_str()).collect();
                anyhow::bail!("Unknown retailer: {}. Configured: {}", name, known.join(", "));
            }
        }

        Ok(self
            .retailers
            .iter()
            .filter(|p| names.is_empty() || names.contains(&p.name))
            .cloned()
            .collect())
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
