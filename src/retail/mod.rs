//! Retailer-specific modules: profiles, HTTP client, parsing and scraping.

pub mod client;
pub mod models;
pub mod parser;
pub mod profile;
pub mod scraper;
pub mod selectors;

pub use client::{PageFetcher, RetailClient};
pub use models::ProductRecord;
pub use parser::Parser;
pub use profile::{DecimalSeparator, ExtractionRules, RetailerProfile};
pub use scraper::SiteScraper;
