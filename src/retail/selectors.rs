//! CSS selectors compiled from a retailer profile.
//!
//! Profiles carry selectors as strings so they can live in TOML. They are
//! compiled once per scraper; an invalid selector fails scraper creation
//! instead of every product.

use crate::error::ScrapeError;
use crate::retail::profile::{IdentifierRule, LinkRule, RetailerProfile};
use scraper::Selector;

/// Compiled form of [`LinkRule`].
#[derive(Debug)]
pub enum LinkSelector {
    Href(Selector),
    DataAttr { attr: String, key: String },
}

/// Compiled form of [`IdentifierRule`].
#[derive(Debug)]
pub enum IdentifierSelector {
    QueryParam { selector: Selector, attr: String, param: String },
    Text(Selector),
}

/// Every selector a site scraper needs, ready to use.
#[derive(Debug)]
pub struct CompiledRules {
    pub tile: Selector,
    pub name: Option<Selector>,
    pub brand: Option<Selector>,
    pub price: Option<Selector>,
    pub quantity: Option<Selector>,
    pub price_per_litre: Option<Selector>,
    pub link: LinkSelector,
    pub identifier: IdentifierSelector,
    pub total: Option<(Selector, String)>,
}

impl CompiledRules {
    /// Compiles the selectors of `profile`.
    pub fn compile(profile: &RetailerProfile) -> Result<Self, ScrapeError> {
        let rules = &profile.rules;
        let parse = |css: &str| compile_one(&profile.name, css);
        let parse_opt = |css: &Option<String>| css.as_deref().map(parse).transpose();

        let link = match &rules.link {
            LinkRule::Href { selector } => LinkSelector::Href(parse(selector)?),
            LinkRule::DataAttr { attr, key } => {
                LinkSelector::DataAttr { attr: attr.clone(), key: key.clone() }
            }
        };

        let identifier = match &rules.identifier {
            IdentifierRule::QueryParam { selector, attr, param } => IdentifierSelector::QueryParam {
                selector: parse(selector)?,
                attr: attr.clone(),
                param: param.clone(),
            },
            IdentifierRule::Text { selector } => IdentifierSelector::Text(parse(selector)?),
        };

        let total = match &rules.total {
            Some(rule) => Some((parse(&rule.selector)?, rule.attr.clone())),
            None => None,
        };

        Ok(Self {
            tile: parse(&rules.tile)?,
            name: parse_opt(&rules.name)?,
            brand: parse_opt(&rules.brand)?,
            price: parse_opt(&rules.price)?,
            quantity: parse_opt(&rules.quantity)?,
            price_per_litre: parse_opt(&rules.price_per_litre)?,
            link,
            identifier,
            total,
        })
    }
}

fn compile_one(retailer: &str, css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector {
        retailer: retailer.to_string(),
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retail::profile::{auchan, continente};

    #[test]
    fn test_builtin_profiles_compile() {
        let rules = CompiledRules::compile(&continente()).unwrap();
        assert!(rules.name.is_some());
        assert!(matches!(rules.link, LinkSelector::Href(_)));
        assert!(matches!(rules.identifier, IdentifierSelector::QueryParam { .. }));

        let rules = CompiledRules::compile(&auchan()).unwrap();
        assert!(rules.name.is_none());
        assert!(matches!(rules.link, LinkSelector::DataAttr { .. }));
        assert!(matches!(rules.identifier, IdentifierSelector::Text(_)));
        assert!(rules.total.is_some());
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let mut profile = auchan();
        profile.rules.tile = "div[[".to_string();

        let err = CompiledRules::compile(&profile).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("div[["));
        assert!(msg.contains("auchan"));
    }
}
