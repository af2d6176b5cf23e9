//! JSON-backed persistence of per-retailer price histories.

mod models;

pub use models::{Entry, PricePoint, PriceStore};

use crate::error::ScrapeError;
use crate::retail::ProductRecord;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// Counts produced by [`PriceStore::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// New EANs added to the store
    pub inserted: usize,
    /// Existing EANs whose price changed
    pub price_changes: usize,
    /// Existing EANs seen at the same price
    pub unchanged: usize,
    /// Records dropped for lack of an EAN
    pub skipped_no_identifier: usize,
}

impl PriceStore {
    /// Merges scraped records into the store.
    ///
    /// New EANs get a single-point history. Known EANs always get their
    /// name, brand and quantity refreshed, and get a new history point only
    /// when the price differs from the latest stored one.
    pub fn merge(&mut self, records: &[ProductRecord]) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for record in records {
            if !record.has_identifier() {
                trace!("Dropping {:?}: no EAN", record.name);
                summary.skipped_no_identifier += 1;
                continue;
            }
            let ean = record.ean.as_deref().unwrap_or_default().trim();

            let point = PricePoint {
                price: record.price,
                price_per_litre: record.price_per_litre,
                timestamp: record.fetched_at,
            };

            let Some(entry) = self.get_mut(ean) else {
                self.insert(
                    ean,
                    Entry {
                        name: record.name.clone(),
                        brand: record.brand.clone(),
                        quantity: record.quantity.clone(),
                        price_history: vec![point],
                    },
                );
                summary.inserted += 1;
                continue;
            };

            entry.name = record.name.clone();
            entry.brand = record.brand.clone();
            entry.quantity = record.quantity.clone();

            let last = entry.latest().map(|p| (p.price, p.timestamp));
            match last {
                Some((price, _)) if price == point.price => summary.unchanged += 1,
                Some((_, observed)) if observed > point.timestamp => {
                    warn!("Ignoring stale price for {}: observed before latest point", ean);
                    summary.unchanged += 1;
                }
                _ => {
                    debug!("Price change for {}: {:?} -> {}", ean, entry.current_price(), point.price);
                    entry.price_history.push(point);
                    summary.price_changes += 1;
                }
            }
        }

        summary
    }
}

/// One retailer's store file.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store for `data_file` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, data_file: &str) -> Self {
        Self::new(dir.as_ref().join(data_file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the store, returning an empty one when the file does not exist.
    pub fn load(&self) -> Result<PriceStore, ScrapeError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No store at {}, starting empty", self.path.display());
                return Ok(PriceStore::new());
            }
            Err(source) => return Err(ScrapeError::StoreIo { path: self.path.clone(), source }),
        };

        let store: PriceStore = serde_json::from_str(&content)
            .map_err(|source| ScrapeError::StoreFormat { path: self.path.clone(), source })?;

        debug!("Loaded {} entries from {}", store.len(), self.path.display());
        Ok(store)
    }

    /// Writes the whole store, replacing the file.
    ///
    /// The document goes to a sibling temporary file first and is then
    /// renamed over the target, so readers never see a partial file.
    pub fn save(&self, store: &PriceStore) -> Result<(), ScrapeError> {
        let io_err = |source| ScrapeError::StoreIo { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(store)
            .map_err(|source| ScrapeError::StoreFormat { path: self.path.clone(), source })?;

        let tmp = self.tmp_path();
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;

        info!("Saved {} entries to {}", store.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
