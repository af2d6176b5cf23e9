//! Site scraper: one component, parameterized per retailer by its profile.

use crate::error::ScrapeError;
use crate::retail::client::PageFetcher;
use crate::retail::models::ProductRecord;
use crate::retail::parser::Parser;
use crate::retail::profile::RetailerProfile;
use crate::retail::selectors::CompiledRules;
use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Default bound on listing pages fetched in one run.
pub const DEFAULT_MAX_PAGES: usize = 200;

/// Scrapes one retailer's paginated listing.
pub struct SiteScraper<'a, F: PageFetcher + ?Sized> {
    profile: RetailerProfile,
    rules: CompiledRules,
    fetcher: &'a F,
    max_pages: usize,
}

impl<'a, F: PageFetcher + ?Sized> SiteScraper<'a, F> {
    /// Creates a scraper for `profile`, compiling its selectors.
    pub fn new(profile: RetailerProfile, fetcher: &'a F) -> Result<Self, ScrapeError> {
        let rules = CompiledRules::compile(&profile)?;
        Ok(Self { profile, rules, fetcher, max_pages: DEFAULT_MAX_PAGES })
    }

    /// Sets the maximum number of listing pages fetched by [`Self::fetch_all`].
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    fn parser(&self) -> Parser<'_> {
        Parser::new(&self.profile, &self.rules)
    }

    /// Fetches the listing page starting at `offset`, keeping at most `limit` products.
    pub async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<ProductRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let url = self.profile.page_url(offset);
        let html = self
            .fetcher
            .get(&url)
            .await
            .with_context(|| format!("Failed to fetch {} listing at offset {}", self.profile.name, offset))?;
        let fetched_at = Utc::now();

        let drafts = self.parser().parse_listing(&html);
        let mut products = Vec::with_capacity(drafts.len().min(limit));

        for draft in drafts {
            if products.len() >= limit {
                break;
            }

            let ean = self.resolve_identifier(&draft.url).await;
            if ean.is_none() && self.profile.rules.require_all {
                warn!("Skipping {} product {:?}: no EAN", self.profile.name, draft.name);
                continue;
            }

            products.push(ProductRecord {
                retailer: self.profile.name.clone(),
                name: draft.name,
                brand: draft.brand,
                price: draft.price,
                quantity: draft.quantity,
                price_per_litre: draft.price_per_litre,
                ean,
                url: draft.url,
                fetched_at,
            });
        }

        debug!("Offset {} of {} yielded {} products", offset, self.profile.name, products.len());
        Ok(products)
    }

    /// Fetches products page by page until `limit` is reached or a page is empty.
    ///
    /// With no limit, the listing's total count is used; if that is unavailable
    /// pagination runs until an empty page or the page bound. A failure on the
    /// first page is an error; a later failure stops pagination and keeps what
    /// was collected.
    pub async fn fetch_all(&self, limit: Option<usize>) -> Result<Vec<ProductRecord>> {
        let limit = match limit {
            Some(limit) => limit,
            None => match self.total_products().await {
                Ok(total) => {
                    info!("{} lists {} products", self.profile.display_name, total);
                    total
                }
                Err(e) => {
                    warn!("No total count for {}, paginating until exhausted: {:#}", self.profile.name, e);
                    usize::MAX
                }
            },
        };

        let mut products: Vec<ProductRecord> = Vec::new();
        let mut offset = 0;
        let mut pages = 0;

        while products.len() < limit {
            if pages >= self.max_pages {
                warn!("Reached page limit ({}) for {}", self.max_pages, self.profile.name);
                break;
            }
            pages += 1;

            let page = match self.fetch_page(offset, limit - products.len()).await {
                Ok(page) => page,
                Err(e) if pages == 1 => return Err(e),
                Err(e) => {
                    warn!("Stopping {} pagination: {:#}", self.profile.name, e);
                    break;
                }
            };

            if page.is_empty() {
                debug!("Empty page at offset {}, stopping", offset);
                break;
            }

            products.extend(page);
            offset += self.profile.page_size;
        }

        info!("Scraped {} products from {}", products.len(), self.profile.display_name);
        Ok(products)
    }

    /// Resolves a product's EAN from its product page. Failures yield `None`.
    pub async fn resolve_identifier(&self, product_url: &str) -> Option<String> {
        match self.fetcher.get(product_url).await {
            Ok(html) => {
                let ean = self.parser().parse_identifier(&html);
                if ean.is_none() {
                    debug!("No EAN found at {}", product_url);
                }
                ean
            }
            Err(e) => {
                warn!("Failed to resolve EAN from {}: {:#}", product_url, e);
                None
            }
        }
    }

    /// Reads the listing's total product count from the first page.
    pub async fn total_products(&self) -> Result<usize> {
        if self.profile.rules.total.is_none() {
            anyhow::bail!("profile {} has no total count rule", self.profile.name);
        }

        let html = self.fetcher.get(&self.profile.page_url(0)).await?;
        self.parser()
            .parse_total(&html)
            .with_context(|| format!("No total count on {} listing", self.profile.name))
    }
}
