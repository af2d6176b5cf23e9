//! Typed errors for scraping and persistence.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    #[error("missing {field} in product tile")]
    MissingField { field: &'static str },

    #[error("invalid {field} value {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid selector {selector:?} in profile {retailer}: {reason}")]
    Selector { retailer: String, selector: String, reason: String },

    #[error("incomplete product {name:?}: {reason}")]
    Incomplete { name: String, reason: &'static str },

    #[error("failed to access store {path}: {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed store {path}: {source}")]
    StoreFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
