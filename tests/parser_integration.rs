//! Integration tests for the listing and product page parsers using fixture files.

use rust_decimal::Decimal;
use std::str::FromStr;
use wine_tracker::retail::profile::{auchan, continente};
use wine_tracker::retail::selectors::CompiledRules;
use wine_tracker::retail::Parser;

const CONTINENTE_LISTING: &str = include_str!("fixtures/continente_listing.html");
const CONTINENTE_PRODUCT: &str = include_str!("fixtures/continente_product.html");
const AUCHAN_LISTING: &str = include_str!("fixtures/auchan_listing.html");
const AUCHAN_PRODUCT: &str = include_str!("fixtures/auchan_product.html");
const EMPTY_LISTING: &str = include_str!("fixtures/empty_listing.html");

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn test_parse_continente_listing() {
    let profile = continente();
    let rules = CompiledRules::compile(&profile).unwrap();
    let parser = Parser::new(&profile, &rules);

    let drafts = parser.parse_listing(CONTINENTE_LISTING);

    // Third tile has no brand and is rejected
    assert_eq!(drafts.len(), 2);

    let wine = &drafts[0];
    assert_eq!(wine.name, "Esporão Reserva Tinto");
    assert_eq!(wine.brand, "Esporão");
    assert_eq!(wine.price, dec("15.99"));
    assert_eq!(wine.quantity, "garrafa 75 cl");
    assert_eq!(wine.price_per_litre, Some(dec("21.32")));
    assert_eq!(wine.url, "https://www.continente.pt/produto/esporao-reserva-tinto-7654321.html");

    assert_eq!(drafts[1].brand, "Casa Ferreirinha");
    assert_eq!(parser.parse_total(CONTINENTE_LISTING), Some(3));
}

#[test]
fn test_parse_continente_product_page() {
    let profile = continente();
    let rules = CompiledRules::compile(&profile).unwrap();
    let parser = Parser::new(&profile, &rules);

    let html = CONTINENTE_PRODUCT.replace("{PID}", "7654321").replace("{EAN}", "5601012011500");
    assert_eq!(parser.parse_identifier(&html).as_deref(), Some("5601012011500"));
}

#[test]
fn test_parse_auchan_listing() {
    let profile = auchan();
    let rules = CompiledRules::compile(&profile).unwrap();
    let parser = Parser::new(&profile, &rules);

    let drafts = parser.parse_listing(AUCHAN_LISTING);
    assert_eq!(drafts.len(), 3);

    let wine = &drafts[0];
    assert_eq!(wine.name, "Esporão Reserva Tinto");
    assert_eq!(wine.price, dec("14.99"));
    assert_eq!(wine.price_per_litre, Some(dec("19.99")));
    assert_eq!(
        wine.url,
        "https://www.auchan.pt/pt/bebidas-e-garrafeira/esporao-reserva-tinto/3001.html"
    );

    assert_eq!(drafts[2].name, "Monte Velho Tinto");
    assert_eq!(drafts[2].price, dec("4.99"));
    assert_eq!(parser.parse_total(AUCHAN_LISTING), Some(3));
}

#[test]
fn test_parse_auchan_product_page() {
    let profile = auchan();
    let rules = CompiledRules::compile(&profile).unwrap();
    let parser = Parser::new(&profile, &rules);

    let html = AUCHAN_PRODUCT.replace("{EAN}", "5601012004427");
    assert_eq!(parser.parse_identifier(&html).as_deref(), Some("5601012004427"));
}

#[test]
fn test_parse_empty_listing() {
    for profile in [continente(), auchan()] {
        let rules = CompiledRules::compile(&profile).unwrap();
        let parser = Parser::new(&profile, &rules);

        assert!(parser.parse_listing(EMPTY_LISTING).is_empty());
        assert!(parser.parse_total(EMPTY_LISTING).is_none());
        assert!(parser.parse_identifier(EMPTY_LISTING).is_none());
    }
}
