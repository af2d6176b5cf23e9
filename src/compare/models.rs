//! Data models for cross-retailer price comparisons.

use crate::store::PricePoint;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest price of a product at one retailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailerPrice {
    pub retailer: String,
    pub price: Decimal,
    pub price_per_litre: Option<Decimal>,
    /// Amount above the cheapest retailer
    pub difference: Decimal,
    /// `difference` relative to the cheapest price, in percent
    pub difference_percent: Option<Decimal>,
}

/// Signed difference between two retailers' prices (`from - to`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceGap {
    pub from: String,
    pub to: String,
    pub difference: Decimal,
}

/// Price comparison of one EAN across the retailers that sell it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub ean: String,
    pub name: String,
    /// Number of retailers holding this EAN
    pub retailers: usize,
    /// Prices in configured retailer order
    pub prices: Vec<RetailerPrice>,
    pub cheapest_retailer: String,
    pub cheapest_price: Decimal,
}

impl Comparison {
    /// Returns the cheapest retailer's price.
    pub fn cheapest(&self) -> Option<&RetailerPrice> {
        self.price_at(&self.cheapest_retailer)
    }

    /// Returns the most expensive price; ties go to the earliest retailer.
    pub fn most_expensive(&self) -> Option<&RetailerPrice> {
        self.prices.iter().rev().max_by_key(|p| p.price)
    }

    /// Returns the price at `retailer`.
    pub fn price_at(&self, retailer: &str) -> Option<&RetailerPrice> {
        self.prices.iter().find(|p| p.retailer == retailer)
    }

    /// Savings of buying at the cheapest retailer instead of the most expensive.
    pub fn max_savings(&self) -> Decimal {
        self.most_expensive().map(|p| p.price.saturating_sub(self.cheapest_price)).unwrap_or_default()
    }

    /// Savings relative to the most expensive price, in percent.
    pub fn max_savings_percent(&self) -> Option<Decimal> {
        let expensive = self.most_expensive()?.price;
        super::percent_of(self.max_savings(), expensive)
    }

    /// Differences between every pair of retailers, in retailer order.
    pub fn pairwise(&self) -> Vec<PriceGap> {
        let mut gaps = Vec::new();
        for (i, a) in self.prices.iter().enumerate() {
            for b in &self.prices[i + 1..] {
                gaps.push(PriceGap {
                    from: a.retailer.clone(),
                    to: b.retailer.clone(),
                    difference: a.price.saturating_sub(b.price),
                });
            }
        }
        gaps
    }
}

/// Full price history of one EAN at one retailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailerHistory {
    pub retailer: String,
    pub name: String,
    pub history: Vec<PricePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_price(retailer: &str, price: &str, cheapest: &str) -> RetailerPrice {
        RetailerPrice {
            retailer: retailer.to_string(),
            price: dec(price),
            price_per_litre: None,
            difference: dec(price) - dec(cheapest),
            difference_percent: None,
        }
    }

    fn make_comparison() -> Comparison {
        Comparison {
            ean: "1234567890123".to_string(),
            name: "Test Wine".to_string(),
            retailers: 3,
            prices: vec![
                make_price("continente", "9.99", "8.99"),
                make_price("auchan", "8.99", "8.99"),
                make_price("pingodoce", "10.49", "8.99"),
            ],
            cheapest_retailer: "auchan".to_string(),
            cheapest_price: dec("8.99"),
        }
    }

    #[test]
    fn test_cheapest_and_most_expensive() {
        let comparison = make_comparison();
        assert_eq!(comparison.cheapest().unwrap().retailer, "auchan");
        assert_eq!(comparison.most_expensive().unwrap().retailer, "pingodoce");
        assert!(comparison.price_at("lidl").is_none());
    }

    #[test]
    fn test_max_savings() {
        let comparison = make_comparison();
        assert_eq!(comparison.max_savings(), dec("1.50"));
        assert_eq!(comparison.max_savings_percent(), Some(dec("14.30")));
    }

    #[test]
    fn test_max_savings_zero_price() {
        let mut comparison = make_comparison();
        for p in &mut comparison.prices {
            p.price = Decimal::ZERO;
        }
        comparison.cheapest_price = Decimal::ZERO;
        assert!(comparison.max_savings_percent().is_none());
        assert_eq!(comparison.max_savings(), Decimal::ZERO);
    }

    #[test]
    fn test_pairwise() {
        let gaps = make_comparison().pairwise();
        assert_eq!(gaps.len(), 3);
        assert_eq!(gaps[0].from, "continente");
        assert_eq!(gaps[0].to, "auchan");
        assert_eq!(gaps[0].difference, dec("1.00"));
        assert_eq!(gaps[1].to, "pingodoce");
        assert_eq!(gaps[1].difference, dec("-0.50"));
        assert_eq!(gaps[2].difference, dec("-1.50"));
    }

    #[test]
    fn test_extreme_prices_saturate() {
        let mut comparison = make_comparison();
        comparison.prices[0].price = Decimal::MIN;
        comparison.prices[2].price = Decimal::MAX;
        comparison.cheapest_price = Decimal::MIN;

        assert_eq!(comparison.max_savings(), Decimal::MAX);
        assert_eq!(comparison.max_savings_percent(), Some(dec("100")));
        assert_eq!(comparison.pairwise()[1].difference, Decimal::MIN);
    }

    #[test]
    fn test_comparison_serde() {
        let comparison = make_comparison();
        let json = serde_json::to_string(&comparison).unwrap();
        assert!(json.contains("\"cheapest_retailer\":\"auchan\""));

        let parsed: Comparison = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, comparison);
    }
}
