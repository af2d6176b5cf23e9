//! wine-tracker - wine price tracker and cross-retailer comparator CLI

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use wine_tracker::commands::{CompareCommand, HistoryCommand, RunCommand, ScrapeCommand};
use wine_tracker::config::{Config, OutputFormat};
use wine_tracker::format::Formatter;

#[derive(Parser)]
#[command(
    name = "wine-tracker",
    version,
    about = "Wine price tracker for Continente and Auchan",
    long_about = "Scrapes wine listings, keeps a price history per retailer and compares prices by EAN."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (table, json, markdown, csv)
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Delay between requests in milliseconds
    #[arg(long, global = true)]
    delay: Option<u64>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every retailer, then compare prices
    Run {
        /// Directory holding the price stores
        output_dir: Option<PathBuf>,

        /// Maximum products per retailer
        limit: Option<usize>,
    },

    /// Scrape retailers and update their price stores
    #[command(alias = "s")]
    Scrape {
        /// Directory holding the price stores
        output_dir: Option<PathBuf>,

        /// Maximum products per retailer
        limit: Option<usize>,

        /// Only scrape these retailers (repeatable)
        #[arg(short, long = "retailer")]
        retailers: Vec<String>,
    },

    /// Compare the latest stored prices across retailers
    #[command(alias = "c")]
    Compare {
        /// Directory holding the price stores
        output_dir: Option<PathBuf>,
    },

    /// Show the price history of one EAN
    History {
        /// Product EAN
        ean: String,

        /// Directory holding the price stores
        output_dir: Option<PathBuf>,
    },

    /// List configured retailers
    Retailers,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Run { output_dir, limit } => {
            apply_paths(&mut config, output_dir, limit);

            let outcome = RunCommand::new(config).execute().await?;
            println!("{}", outcome.output);
            outcome.status()?;
        }

        Commands::Scrape { output_dir, limit, retailers } => {
            apply_paths(&mut config, output_dir, limit);

            let profiles = config.select_retailers(&retailers)?;
            let cmd = ScrapeCommand::new(config, profiles);
            println!("{}", cmd.execute().await?);
        }

        Commands::Compare { output_dir } => {
            apply_paths(&mut config, output_dir, None);
            println!("{}", CompareCommand::new(config).execute()?);
        }

        Commands::History { ean, output_dir } => {
            apply_paths(&mut config, output_dir, None);
            println!("{}", HistoryCommand::new(config).execute(&ean)?);
        }

        Commands::Retailers => {
            println!("{}", Formatter::new(config.format).format_retailers(&config.retailers));
        }
    }

    Ok(())
}

fn apply_paths(config: &mut Config, output_dir: Option<PathBuf>, limit: Option<usize>) {
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if let Some(limit) = limit {
        config.product_limit = Some(limit);
    }
}
