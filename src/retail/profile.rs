//! Retailer profiles: the configuration that drives the site scraper.
//!
//! Every retailer is described by data rather than code. A profile names
//! the listing URL, its pagination scheme and the rules used to pull each
//! field out of a product tile. Update the built-in profiles here when a
//! retailer changes its HTML; add new retailers through the config file.

use serde::{Deserialize, Serialize};

/// Decimal separator used by prices scraped from visible text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimalSeparator {
    /// `1.234,56 €`
    #[default]
    Comma,
    /// `1,234.56`
    Point,
}

/// Keys of the JSON object embedded in a tile attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataKeys {
    pub name: String,
    pub brand: String,
    pub price: String,
    /// Subtracted from the price when present
    #[serde(default)]
    pub discount: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
}

/// Where the product page link lives inside a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkRule {
    /// `href` attribute of the first element matching `selector`
    Href { selector: String },
    /// A key of a JSON object stored in a tile attribute
    DataAttr { attr: String, key: String },
}

/// How the EAN is found on the product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentifierRule {
    /// Query parameter `param` of the URL held in `attr` of elements matching `selector`
    QueryParam { selector: String, attr: String, param: String },
    /// Trimmed text of the first element matching `selector`
    Text { selector: String },
}

/// Attribute holding the listing's total product count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalRule {
    pub selector: String,
    pub attr: String,
}

/// Field-extraction rules for product tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRules {
    /// Product tile container
    pub tile: String,
    /// Tile attribute carrying a JSON object with product data
    #[serde(default)]
    pub data_attr: Option<String>,
    #[serde(default)]
    pub keys: Option<DataKeys>,
    /// Fallback selectors used when the JSON data lacks a field
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub price_per_litre: Option<String>,
    pub link: LinkRule,
    pub identifier: IdentifierRule,
    #[serde(default)]
    pub total: Option<TotalRule>,
    #[serde(default)]
    pub decimal: DecimalSeparator,
    /// Drop products missing any descriptive field or the EAN
    #[serde(default)]
    pub require_all: bool,
}

/// A retailer the tracker knows how to scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailerProfile {
    /// Machine name, also the label used by the comparator
    pub name: String,
    pub display_name: String,
    /// Scheme and host, used for relative product links
    pub origin: String,
    pub listing_url: String,
    /// Query string template with `{offset}` and `{size}` placeholders
    pub listing_query: String,
    pub page_size: usize,
    /// JSON store file name inside the output directory
    pub data_file: String,
    pub rules: ExtractionRules,
}

impl RetailerProfile {
    /// Returns the listing URL for the page starting at `offset`.
    pub fn page_url(&self, offset: usize) -> String {
        let query = self
            .listing_query
            .replace("{offset}", &offset.to_string())
            .replace("{size}", &self.page_size.to_string());

        if query.is_empty() {
            self.listing_url.clone()
        } else {
            format!("{}?{}", self.listing_url, query)
        }
    }

    /// Turns a tile link into an absolute URL.
    pub fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.origin.trim_end_matches('/'), href)
        } else {
            format!("{}/{}", self.origin.trim_end_matches('/'), href)
        }
    }

    /// Points the listing and product links at another host, keeping paths.
    pub fn with_origin(mut self, origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        if let Some(path) = self.listing_url.strip_prefix(&self.origin) {
            self.listing_url = format!("{}{}", origin, path);
        }
        self.origin = origin.to_string();
        self
    }
}

/// Continente wine listing.
pub fn continente() -> RetailerProfile {
    RetailerProfile {
        name: "continente".to_string(),
        display_name: "Continente".to_string(),
        origin: "https://www.continente.pt".to_string(),
        listing_url: "https://www.continente.pt/bebidas-e-garrafeira/vinhos/".to_string(),
        listing_query: "start={offset}&srule=FOOD-Bebidas&pmin=0.01".to_string(),
        page_size: 36,
        data_file: "continente_wine_data.json".to_string(),
        rules: ExtractionRules {
            tile: "div.product-tile".to_string(),
            data_attr: Some("data-product-tile-impression".to_string()),
            keys: Some(DataKeys {
                name: "name".to_string(),
                brand: "brand".to_string(),
                price: "price".to_string(),
                discount: None,
                quantity: None,
            }),
            name: Some("h2.pwc-tile--description".to_string()),
            brand: Some("p.pwc-tile--brand".to_string()),
            price: Some("span.ct-price-formatted".to_string()),
            quantity: Some("p.pwc-tile--quantity".to_string()),
            price_per_litre: Some("span.ct-price-value".to_string()),
            link: LinkRule::Href { selector: "div.ct-pdp-link a".to_string() },
            identifier: IdentifierRule::QueryParam {
                selector: "a.js-details-header".to_string(),
                attr: "data-url".to_string(),
                param: "ean".to_string(),
            },
            total: Some(TotalRule {
                selector: "div.grid-footer".to_string(),
                attr: "data-total-count".to_string(),
            }),
            decimal: DecimalSeparator::Comma,
            require_all: true,
        },
    }
}

/// Auchan wine cellar listing.
pub fn auchan() -> RetailerProfile {
    RetailerProfile {
        name: "auchan".to_string(),
        display_name: "Auchan".to_string(),
        origin: "https://www.auchan.pt".to_string(),
        listing_url: "https://www.auchan.pt/pt/bebidas-e-garrafeira/garrafeira/".to_string(),
        listing_query: "sz={size}&start={offset}".to_string(),
        page_size: 24,
        data_file: "auchan_wine_data.json".to_string(),
        rules: ExtractionRules {
            tile: "div.product-tile".to_string(),
            data_attr: Some("data-gtm-new".to_string()),
            keys: Some(DataKeys {
                name: "item_name".to_string(),
                brand: "item_brand".to_string(),
                price: "price".to_string(),
                discount: Some("discount".to_string()),
                quantity: Some("quantity".to_string()),
            }),
            name: None,
            brand: None,
            price: None,
            quantity: None,
            price_per_litre: Some("span.auc-measures--price-per-unit".to_string()),
            link: LinkRule::DataAttr {
                attr: "data-urls".to_string(),
                key: "productUrl".to_string(),
            },
            identifier: IdentifierRule::Text { selector: "span.product-ean".to_string() },
            total: Some(TotalRule {
                selector: "input[name='auc-js-search-results-total']".to_string(),
                attr: "value".to_string(),
            }),
            decimal: DecimalSeparator::Point,
            require_all: false,
        },
    }
}

/// Returns the built-in retailer profiles in comparison order.
pub fn builtin() -> Vec<RetailerProfile> {
    vec![continente(), auchan()]
}
