//! Cross-retailer price comparison over the persisted stores.

mod models;

pub use models::{Comparison, PriceGap, RetailerHistory, RetailerPrice};

use crate::retail::RetailerProfile;
use crate::store::{JsonStore, PricePoint, PriceStore};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Joins retailer stores on EAN.
pub struct Comparator {
    stores: Vec<(String, PriceStore)>,
}

impl Comparator {
    /// Creates a comparator over `(retailer, store)` pairs, in tie-break order.
    pub fn new(stores: Vec<(String, PriceStore)>) -> Result<Self> {
        if stores.len() < 2 {
            anyhow::bail!("At least two retailers are required for comparison");
        }
        Ok(Self { stores })
    }

    /// Loads every profile's store from `output_dir`.
    ///
    /// A missing file counts as an empty store.
    pub fn load(output_dir: &Path, profiles: &[RetailerProfile]) -> Result<Self> {
        let mut stores = Vec::with_capacity(profiles.len());

        for profile in profiles {
            let json_store = JsonStore::in_dir(output_dir, &profile.data_file);
            if !json_store.path().exists() {
                warn!("No data file found for {}", profile.display_name);
            }

            let store = json_store
                .load()
                .with_context(|| format!("Failed to load {} store", profile.display_name))?;
            stores.push((profile.name.clone(), store));
        }

        Self::new(stores)
    }

    /// Retailer names in tie-break order.
    pub fn retailers(&self) -> impl Iterator<Item = &str> {
        self.stores.iter().map(|(name, _)| name.as_str())
    }

    /// Compares the latest prices of every EAN held by at least two retailers.
    pub fn compare(&self) -> Vec<Comparison> {
        let eans: BTreeSet<&String> = self.stores.iter().flat_map(|(_, s)| s.eans()).collect();
        let mut results = Vec::new();

        for ean in eans {
            let holders: Vec<(&str, &str, &PricePoint)> = self
                .stores
                .iter()
                .filter_map(|(retailer, store)| {
                    let entry = store.get(ean)?;
                    Some((retailer.as_str(), entry.name.as_str(), entry.latest()?))
                })
                .collect();

            if holders.len() < 2 {
                continue;
            }

            // min_by_key keeps the first of equal minima
            let Some(&(cheapest_retailer, _, cheapest)) = holders.iter().min_by_key(|h| h.2.price)
            else {
                continue;
            };
            let cheapest_price = cheapest.price;

            let prices = holders
                .iter()
                .map(|&(retailer, _, point)| {
                    let difference = point.price.saturating_sub(cheapest_price);
                    RetailerPrice {
                        retailer: retailer.to_string(),
                        price: point.price,
                        price_per_litre: point.price_per_litre,
                        difference,
                        difference_percent: percent_of(difference, cheapest_price),
                    }
                })
                .collect();

            debug!("{}: cheapest at {} ({})", ean, cheapest_retailer, cheapest_price);

            results.push(Comparison {
                ean: ean.clone(),
                name: holders[0].1.to_string(),
                retailers: holders.len(),
                prices,
                cheapest_retailer: cheapest_retailer.to_string(),
                cheapest_price,
            });
        }

        info!("Compared {} products across {} retailers", results.len(), self.stores.len());
        results
    }

    /// Returns the price history of `ean` at every retailer holding it.
    pub fn price_history(&self, ean: &str) -> Vec<RetailerHistory> {
        self.stores
            .iter()
            .filter_map(|(retailer, store)| {
                store.get(ean).map(|entry| RetailerHistory {
                    retailer: retailer.clone(),
                    name: entry.name.clone(),
                    history: entry.price_history.clone(),
                })
            })
            .collect()
    }
}

/// `part` as a percentage of `whole`; `None` for a zero base or when the
/// quotient does not fit a `Decimal`.
pub(crate) fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole.is_zero() {
        return None;
    }
    let percent = part.checked_div(whole)?.checked_mul(Decimal::ONE_HUNDRED)?;
    Some(percent.round_dp(2))
}
