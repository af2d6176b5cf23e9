//! HTML parser for retailer listing and product pages.

use crate::error::ScrapeError;
use crate::retail::profile::{DecimalSeparator, RetailerProfile};
use crate::retail::selectors::{CompiledRules, IdentifierSelector, LinkSelector};
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, trace, warn};

type TileData = Map<String, Value>;

/// Product fields read from a listing tile, before EAN resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDraft {
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    pub quantity: String,
    pub price_per_litre: Option<Decimal>,
    pub url: String,
}

/// Parser for the pages of one retailer.
pub struct Parser<'a> {
    profile: &'a RetailerProfile,
    rules: &'a CompiledRules,
}

impl<'a> Parser<'a> {
    /// Creates a parser bound to a profile and its compiled selectors.
    pub fn new(profile: &'a RetailerProfile, rules: &'a CompiledRules) -> Self {
        Self { profile, rules }
    }

    /// Parses every product tile of a listing page.
    ///
    /// Tiles that fail to parse are logged and skipped.
    pub fn parse_listing(&self, html: &str) -> Vec<TileDraft> {
        let document = Html::parse_document(html);
        let mut drafts = Vec::new();

        for element in document.select(&self.rules.tile) {
            match self.parse_tile(element) {
                Ok(draft) => {
                    trace!("Parsed tile: {} - {}", draft.name, draft.price);
                    drafts.push(draft);
                }
                Err(e) => warn!("Skipping {} product: {}", self.profile.name, e),
            }
        }

        debug!("Parsed {} products from {} listing", drafts.len(), self.profile.name);
        drafts
    }

    /// Parses a single product tile.
    pub fn parse_tile(&self, element: ElementRef) -> Result<TileDraft, ScrapeError> {
        let rules = &self.profile.rules;
        let data = self.tile_data(element);
        let keys = rules.keys.as_ref();

        let name = keys
            .and_then(|k| json_text(data.as_ref(), &k.name))
            .or_else(|| select_text(element, self.rules.name.as_ref()))
            .ok_or(ScrapeError::MissingField { field: "name" })?;

        let brand = keys
            .and_then(|k| json_text(data.as_ref(), &k.brand))
            .or_else(|| select_text(element, self.rules.brand.as_ref()))
            .unwrap_or_default();

        let quantity = keys
            .and_then(|k| k.quantity.as_deref())
            .and_then(|key| json_text(data.as_ref(), key))
            .or_else(|| select_text(element, self.rules.quantity.as_ref()))
            .unwrap_or_default();

        let price = self.tile_price(element, data.as_ref())?;

        let price_per_litre = match &self.rules.price_per_litre {
            Some(selector) => {
                let text = select_text(element, Some(selector))
                    .ok_or(ScrapeError::MissingField { field: "price_per_litre" })?;
                Some(parse_price_text(&text, rules.decimal).ok_or_else(|| {
                    ScrapeError::InvalidNumber { field: "price_per_litre", value: text.clone() }
                })?)
            }
            None => None,
        };

        let href = self.tile_link(element).ok_or(ScrapeError::MissingField { field: "link" })?;
        let url = self.profile.absolute_url(&href);

        if rules.require_all {
            let reason = if brand.is_empty() {
                Some("empty brand")
            } else if quantity.is_empty() {
                Some("empty quantity")
            } else if price.is_zero() {
                Some("zero price")
            } else if price_per_litre.is_some_and(|p| p.is_zero()) {
                Some("zero price per litre")
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(ScrapeError::Incomplete { name, reason });
            }
        }

        Ok(TileDraft { name, brand, price, quantity, price_per_litre, url })
    }

    /// Extracts the EAN from a product page.
    pub fn parse_identifier(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        match &self.rules.identifier {
            IdentifierSelector::QueryParam { selector, attr, param } => document
                .select(selector)
                .filter_map(|e| e.value().attr(attr))
                .find_map(|url| extract_query_param(url, param)),
            IdentifierSelector::Text(selector) => document
                .select(selector)
                .map(|e| e.text().collect::<String>().trim().to_string())
                .find(|text| !text.is_empty()),
        }
    }

    /// Reads the listing's total product count.
    pub fn parse_total(&self, html: &str) -> Option<usize> {
        let (selector, attr) = self.rules.total.as_ref()?;
        let document = Html::parse_document(html);

        let raw = document.select(selector).find_map(|e| e.value().attr(attr))?;
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

        digits.parse().ok()
    }

    /// Reads the JSON object embedded in the tile, if any.
    fn tile_data(&self, element: ElementRef) -> Option<TileData> {
        let attr = self.profile.rules.data_attr.as_deref()?;
        let raw = element.value().attr(attr)?;

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => None,
            Err(e) => {
                debug!("Malformed {} in {} tile, using HTML fields: {}", attr, self.profile.name, e);
                None
            }
        }
    }

    /// Price from the JSON data (minus any discount), else from the visible text.
    fn tile_price(&self, element: ElementRef, data: Option<&TileData>) -> Result<Decimal, ScrapeError> {
        let keys = self.profile.rules.keys.as_ref();

        if let Some(price) = keys.and_then(|k| json_decimal(data, &k.price, "price")) {
            let price = price?;
            let discount = match keys.and_then(|k| k.discount.as_deref()) {
                Some(key) => json_decimal(data, key, "discount").transpose()?.unwrap_or_default(),
                None => Decimal::ZERO,
            };
            return price.checked_sub(discount).ok_or_else(|| ScrapeError::InvalidNumber {
                field: "discount",
                value: discount.to_string(),
            });
        }

        let text = select_text(element, self.rules.price.as_ref())
            .ok_or(ScrapeError::MissingField { field: "price" })?;

        parse_price_text(&text, self.profile.rules.decimal)
            .ok_or(ScrapeError::InvalidNumber { field: "price", value: text })
    }

    fn tile_link(&self, element: ElementRef) -> Option<String> {
        match &self.rules.link {
            LinkSelector::Href(selector) => element
                .select(selector)
                .find_map(|e| e.value().attr("href"))
                .map(|href| href.trim().to_string())
                .filter(|href| !href.is_empty()),
            LinkSelector::DataAttr { attr, key } => {
                let raw = element.value().attr(attr)?;
                let map = match serde_json::from_str::<Value>(raw) {
                    Ok(Value::Object(map)) => map,
                    _ => return None,
                };
                json_text(Some(&map), key)
            }
        }
    }
}

/// Parses a price from visible text such as `€1.234,56` or `13.32 €/Lt`.
pub fn parse_price_text(text: &str, decimal: DecimalSeparator) -> Option<Decimal> {
    let cleaned: String =
        text.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',').collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match decimal {
        DecimalSeparator::Comma => cleaned.replace('.', "").replace(',', "."),
        DecimalSeparator::Point => cleaned.replace(',', ""),
    };

    let normalized = normalized.trim_matches('.');
    Decimal::from_str(normalized).ok()
}

/// Extracts and decodes a query parameter from a URL or bare query string.
pub fn extract_query_param(url: &str, param: &str) -> Option<String> {
    let query = match url.find('?') {
        Some(start) => &url[start + 1..],
        None => url,
    };
    let query = query.split('#').next().unwrap_or(query);

    let needle = format!("{}=", param);
    query
        .split('&')
        .filter_map(|pair| pair.strip_prefix(needle.as_str()))
        .filter(|value| !value.is_empty())
        .find_map(|value| urlencoding::decode(value).ok().map(|v| v.into_owned()))
}

fn select_text(element: ElementRef, selector: Option<&Selector>) -> Option<String> {
    let text = element.select(selector?).next()?.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn json_text(data: Option<&TileData>, key: &str) -> Option<String> {
    match data?.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_decimal(
    data: Option<&TileData>,
    key: &str,
    field: &'static str,
) -> Option<Result<Decimal, ScrapeError>> {
    let value = data?.get(key)?;
    let text = match value {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    Some(Decimal::from_str(&text).map_err(|_| ScrapeError::InvalidNumber { field, value: text }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retail::profile::{auchan, continente};

    fn first_tile(parser: &Parser, html: &str) -> Result<TileDraft, ScrapeError> {
        let document = Html::parse_document(html);
        let element = document.select(&parser.rules.tile).next().expect("fixture has a tile");
        parser.parse_tile(element)
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const CONTINENTE_TILE: &str = r#"
        <div class="product-tile" data-product-tile-impression='{"name": "Test Wine", "brand": "Test Brand", "price": "9.99"}'>
            <div class="ct-pdp-link"><a href="https://www.continente.pt/test-wine"></a></div>
            <p class="pwc-tile--quantity">garrafa 75cl</p>
            <span class="ct-price-value">€13,32</span>
        </div>
    "#;

    const CONTINENTE_FALLBACK_TILE: &str = r#"
        <div class="product-tile" data-product-tile-impression='{name: '>
            <h2 class="pwc-tile--description">Test Wine Fallback</h2>
            <p class="pwc-tile--brand">Test Brand Fallback</p>
            <span class="ct-price-formatted">€9,99</span>
            <div class="ct-pdp-link"><a href="/test-wine"></a></div>
            <p class="pwc-tile--quantity">garrafa 75cl</p>
            <span class="ct-price-value">€13,32</span>
        </div>
    "#;

    const AUCHAN_TILE: &str = r#"
        <div class="product-tile"
            data-gtm-new='{"item_name": "Test Wine 0", "item_brand": "Test Brand", "price": "9.99", "discount": "1.00", "quantity": "1"}'
            data-urls='{"productUrl": "/test-wine-0"}'>
            <span class="auc-measures--price-per-unit">13.32 €/Lt</span>
        </div>
    "#;

    // Price text tests

    #[test]
    fn test_parse_price_comma() {
        assert_eq!(parse_price_text("€13,32", DecimalSeparator::Comma), Some(dec("13.32")));
        assert_eq!(parse_price_text("1.234,56 €", DecimalSeparator::Comma), Some(dec("1234.56")));
        assert_eq!(parse_price_text("€9", DecimalSeparator::Comma), Some(dec("9")));
    }

    #[test]
    fn test_parse_price_point() {
        assert_eq!(parse_price_text("13.32 €/Lt", DecimalSeparator::Point), Some(dec("13.32")));
        assert_eq!(parse_price_text("1,234.56", DecimalSeparator::Point), Some(dec("1234.56")));
    }

    #[test]
    fn test_parse_price_empty() {
        assert_eq!(parse_price_text("", DecimalSeparator::Comma), None);
        assert_eq!(parse_price_text("€/Lt", DecimalSeparator::Point), None);
        assert_eq!(parse_price_text("N/A", DecimalSeparator::Comma), None);
    }

    // Query parameter tests

    #[test]
    fn test_extract_query_param() {
        assert_eq!(extract_query_param("?ean=1234567890123", "ean").as_deref(), Some("1234567890123"));
        assert_eq!(
            extract_query_param("https://x.pt/p?pid=7&ean=5601#top", "ean").as_deref(),
            Some("5601")
        );
        assert_eq!(extract_query_param("ean=56%2001", "ean").as_deref(), Some("56 01"));
        assert!(extract_query_param("?pid=7", "ean").is_none());
        assert!(extract_query_param("?ean=", "ean").is_none());
        assert!(extract_query_param("?clean=1", "ean").is_none());
    }

    // Tile tests

    #[test]
    fn test_continente_tile_from_json() {
        let profile = continente();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        let draft = first_tile(&parser, CONTINENTE_TILE).unwrap();
        assert_eq!(draft.name, "Test Wine");
        assert_eq!(draft.brand, "Test Brand");
        assert_eq!(draft.price, dec("9.99"));
        assert_eq!(draft.quantity, "garrafa 75cl");
        assert_eq!(draft.price_per_litre, Some(dec("13.32")));
        assert_eq!(draft.url, "https://www.continente.pt/test-wine");
    }

    #[test]
    fn test_continente_tile_falls_back_to_html() {
        let profile = continente();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        let draft = first_tile(&parser, CONTINENTE_FALLBACK_TILE).unwrap();
        assert_eq!(draft.name, "Test Wine Fallback");
        assert_eq!(draft.brand, "Test Brand Fallback");
        assert_eq!(draft.price, dec("9.99"));
        assert_eq!(draft.url, "https://www.continente.pt/test-wine");
    }

    #[test]
    fn test_continente_incomplete_tile_rejected() {
        let profile = continente();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        let html = r#"
            <div class="product-tile" data-product-tile-impression='{"name": "No Brand", "price": "5.00"}'>
                <div class="ct-pdp-link"><a href="/x"></a></div>
                <p class="pwc-tile--quantity">garrafa 75cl</p>
                <span class="ct-price-value">€6,67</span>
            </div>
        "#;

        let err = first_tile(&parser, html).unwrap_err();
        assert!(matches!(err, ScrapeError::Incomplete { reason: "empty brand", .. }));
    }

    #[test]
    fn test_auchan_tile_subtracts_discount() {
        let profile = auchan();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        let draft = first_tile(&parser, AUCHAN_TILE).unwrap();
        assert_eq!(draft.name, "Test Wine 0");
        assert_eq!(draft.brand, "Test Brand");
        assert_eq!(draft.price, dec("8.99"));
        assert_eq!(draft.quantity, "1");
        assert_eq!(draft.price_per_litre, Some(dec("13.32")));
        assert_eq!(draft.url, "https://www.auchan.pt/test-wine-0");
    }

    #[test]
    fn test_auchan_numeric_json_price() {
        let profile = auchan();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        let html = r#"
            <div class="product-tile"
                data-gtm-new='{"item_name": "Numeric", "item_brand": "B", "price": 12.5}'
                data-urls='{"productUrl": "/numeric"}'>
                <span class="auc-measures--price-per-unit">16.67 €/Lt</span>
            </div>
        "#;

        let draft = first_tile(&parser, html).unwrap();
        assert_eq!(draft.price, dec("12.5"));
    }

    fn auchan_tile_with(price: &str, discount: &str) -> String {
        format!(
            r#"
            <div class="product-tile"
                data-gtm-new='{{"item_name": "Test", "item_brand": "B", "price": "{}", "discount": "{}"}}'
                data-urls='{{"productUrl": "/t"}}'>
                <span class="auc-measures--price-per-unit">4.00 €/Lt</span>
            </div>
        "#,
            price, discount
        )
    }

    #[test]
    fn test_auchan_malformed_discount_names_field() {
        let profile = auchan();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        let err = first_tile(&parser, &auchan_tile_with("3.00", "abc")).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidNumber { field: "discount", .. }));

        let err = first_tile(&parser, &auchan_tile_with("x3", "1.00")).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidNumber { field: "price", .. }));
    }

    #[test]
    fn test_auchan_discount_overflow_is_error() {
        let profile = auchan();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        let html = auchan_tile_with("79228162514264337593543950335", "-1");
        let err = first_tile(&parser, &html).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidNumber { field: "discount", .. }));
    }

    #[test]
    fn test_auchan_missing_price_per_litre_is_error() {
        let profile = auchan();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        let html = r#"
            <div class="product-tile"
                data-gtm-new='{"item_name": "Test", "item_brand": "B", "price": "3.00"}'
                data-urls='{"productUrl": "/t"}'>
            </div>
        "#;

        let err = first_tile(&parser, html).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingField { field: "price_per_litre" }));
    }

    #[test]
    fn test_auchan_missing_link_is_error() {
        let profile = auchan();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        let html = r#"
            <div class="product-tile"
                data-gtm-new='{"item_name": "Test", "item_brand": "B", "price": "3.00"}'>
                <span class="auc-measures--price-per-unit">4.00 €/Lt</span>
            </div>
        "#;

        let err = first_tile(&parser, html).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingField { field: "link" }));
    }

    #[test]
    fn test_parse_listing_skips_bad_tiles() {
        let profile = auchan();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        let html = format!(
            "<div>{}<div class=\"product-tile\" data-gtm-new='not json'></div>{}</div>",
            AUCHAN_TILE, AUCHAN_TILE
        );

        let drafts = parser.parse_listing(&html);
        assert_eq!(drafts.len(), 2);
    }

    // Identifier and total tests

    #[test]
    fn test_continente_identifier() {
        let profile = continente();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        let html = r#"
            <a class="js-details-header" data-url="?pid=1"></a>
            <a class="js-details-header" data-url="?ean=1234567890123"></a>
        "#;
        assert_eq!(parser.parse_identifier(html).as_deref(), Some("1234567890123"));
        assert!(parser.parse_identifier("<div></div>").is_none());
    }

    #[test]
    fn test_auchan_identifier() {
        let profile = auchan();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        let html = r#"<span class="product-ean"> 5601234567890 </span>"#;
        assert_eq!(parser.parse_identifier(html).as_deref(), Some("5601234567890"));
        assert!(parser.parse_identifier(r#"<span class="product-ean"> </span>"#).is_none());
    }

    #[test]
    fn test_parse_total() {
        let profile = continente();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);
        let html = r#"<div class="col-12 grid-footer" data-total-count="1,204"></div>"#;
        assert_eq!(parser.parse_total(html), Some(1204));

        let profile = auchan();
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);
        let html = r#"<input name="auc-js-search-results-total" value="311">"#;
        assert_eq!(parser.parse_total(html), Some(311));
        assert!(parser.parse_total("<div></div>").is_none());
    }
}
