//! Persisted price-history models.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One price observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: Decimal,
    #[serde(default)]
    pub price_per_litre: Option<Decimal>,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// A product as persisted for one retailer, keyed by EAN in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub quantity: String,
    /// Chronological, append-only
    #[serde(default)]
    pub price_history: Vec<PricePoint>,
}

impl Entry {
    /// Returns the most recent observation.
    pub fn latest(&self) -> Option<&PricePoint> {
        self.price_history.last()
    }

    /// Returns the most recent price.
    pub fn current_price(&self) -> Option<Decimal> {
        self.latest().map(|p| p.price)
    }
}

/// All persisted products of one retailer, ordered by EAN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceStore {
    entries: BTreeMap<String, Entry>,
}

impl PriceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ean: &str) -> Option<&Entry> {
        self.entries.get(ean)
    }

    pub fn get_mut(&mut self, ean: &str) -> Option<&mut Entry> {
        self.entries.get_mut(ean)
    }

    pub fn contains(&self, ean: &str) -> bool {
        self.entries.contains_key(ean)
    }

    /// Inserts or replaces an entry.
    pub fn insert(&mut self, ean: impl Into<String>, entry: Entry) {
        self.entries.insert(ean.into(), entry);
    }

    /// Iterates entries in EAN order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    /// Iterates stored EANs in order.
    pub fn eans(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// RFC 3339 timestamps; naive ISO-8601 values from older files are read as UTC.
mod timestamp {
    use super::*;
    use serde::{de, Deserializer, Serializer};

    const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT).ok().map(|naive| naive.and_utc())
    }
}
