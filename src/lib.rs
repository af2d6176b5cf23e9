//! wine-tracker - wine price tracker for Portuguese retailers
//!
//! Scrapes wine listings with TLS fingerprint emulation, keeps a per-retailer
//! price history on disk and compares the latest prices across retailers by EAN.

pub mod commands;
pub mod compare;
pub mod config;
pub mod error;
pub mod format;
pub mod retail;
pub mod store;

pub use compare::{Comparator, Comparison};
pub use config::Config;
pub use error::ScrapeError;
pub use retail::{ProductRecord, RetailerProfile};
pub use store::{JsonStore, PriceStore};
