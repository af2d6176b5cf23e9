//! Data models for scraped retailer products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product observed on one retailer listing during one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Retailer profile name this product was scraped from
    pub retailer: String,
    /// Product description
    pub name: String,
    /// Brand or producer
    pub brand: String,
    /// Shelf price after discounts
    pub price: Decimal,
    /// Free-text volume, e.g. "garrafa 75cl"
    pub quantity: String,
    /// Price per litre, when the retailer publishes one
    pub price_per_litre: Option<Decimal>,
    /// European Article Number resolved from the product page
    pub ean: Option<String>,
    /// Absolute product page URL
    pub url: String,
    /// When the listing page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Returns true if the record carries a usable EAN.
    pub fn has_identifier(&self) -> bool {
        self.ean.as_deref().is_some_and(|ean| !ean.trim().is_empty())
    }
}
