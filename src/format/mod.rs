//! Output formatting for comparisons, histories and run reports (table, JSON, markdown, CSV).

use crate::commands::ScrapeReport;
use crate::compare::{Comparison, PriceGap, RetailerHistory};
use crate::config::OutputFormat;
use crate::retail::RetailerProfile;
use rust_decimal::Decimal;
use serde::Serialize;

const NAME_WIDTH: usize = 40;

/// A comparison as written to JSON, with its pairwise gaps.
#[derive(Serialize)]
struct ComparisonJson<'a> {
    #[serde(flatten)]
    comparison: &'a Comparison,
    gaps: Vec<PriceGap>,
}

/// Formats command results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats comparisons with one price column per retailer in `retailers`.
    pub fn format_comparisons(&self, retailers: &[&str], comparisons: &[Comparison]) -> String {
        if comparisons.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => Self::comparison_csv_header().to_string(),
                _ => "No products found at two or more retailers.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                let rows: Vec<ComparisonJson> = comparisons
                    .iter()
                    .map(|c| ComparisonJson { comparison: c, gaps: c.pairwise() })
                    .collect();
                Self::json(&rows)
            }
            OutputFormat::Table => self.table_comparisons(retailers, comparisons),
            OutputFormat::Markdown => self.markdown_comparisons(retailers, comparisons),
            OutputFormat::Csv => self.csv_comparisons(comparisons),
        }
    }

    /// Formats the price history of one EAN.
    pub fn format_history(&self, ean: &str, histories: &[RetailerHistory]) -> String {
        if histories.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => Self::history_csv_header().to_string(),
                _ => format!("No price history for EAN {}.", ean),
            };
        }

        match self.format {
            OutputFormat::Json => Self::json(histories),
            OutputFormat::Table => self.table_history(ean, histories),
            OutputFormat::Markdown => self.markdown_history(ean, histories),
            OutputFormat::Csv => self.csv_history(ean, histories),
        }
    }

    /// Formats the per-retailer outcome of a scrape run.
    pub fn format_reports(&self, reports: &[ScrapeReport]) -> String {
        match self.format {
            OutputFormat::Json => Self::json(reports),
            OutputFormat::Table => self.table_reports(reports),
            OutputFormat::Markdown => self.markdown_reports(reports),
            OutputFormat::Csv => self.csv_reports(reports),
        }
    }

    /// Formats the configured retailer profiles.
    pub fn format_retailers(&self, profiles: &[RetailerProfile]) -> String {
        match self.format {
            OutputFormat::Json => Self::json(profiles),
            OutputFormat::Table => {
                let mut lines = Vec::new();
                lines.push(format!(
                    "{:<12}  {:<16}  {:>5}  {:<28}  {}",
                    "Name", "Display", "Page", "Data file", "Listing"
                ));
                lines.push(format!("{:-<12}  {:-<16}  {:->5}  {:-<28}  {:-<40}", "", "", "", "", ""));
                for p in profiles {
                    lines.push(format!(
                        "{:<12}  {:<16}  {:>5}  {:<28}  {}",
                        p.name, p.display_name, p.page_size, p.data_file, p.listing_url
                    ));
                }
                lines.join("\n")
            }
            OutputFormat::Markdown => {
                let mut lines = vec![
                    "| Name | Display | Page size | Data file | Listing |".to_string(),
                    "|------|---------|-----------|-----------|---------|".to_string(),
                ];
                for p in profiles {
                    lines.push(format!(
                        "| {} | {} | {} | {} | {} |",
                        p.name, p.display_name, p.page_size, p.data_file, p.listing_url
                    ));
                }
                lines.join("\n")
            }
            OutputFormat::Csv => {
                let mut lines = vec!["name,display_name,page_size,data_file,listing_url".to_string()];
                for p in profiles {
                    lines.push(format!(
                        "{},{},{},{},{}",
                        Self::csv_escape(&p.name),
                        Self::csv_escape(&p.display_name),
                        p.page_size,
                        Self::csv_escape(&p.data_file),
                        Self::csv_escape(&p.listing_url)
                    ));
                }
                lines.join("\n")
            }
        }
    }

    // JSON formatting

    fn json<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_comparisons(&self, retailers: &[&str], comparisons: &[Comparison]) -> String {
        let ean_width = 14;
        let name_width = NAME_WIDTH;
        let price_width = retailers.iter().map(|r| r.chars().count()).max().unwrap_or(0).max(10);

        let mut lines = Vec::new();

        let mut header = format!("{:<ean_width$}  {:<name_width$}", "EAN", "Name");
        let mut rule = format!("{:-<ean_width$}  {:-<name_width$}", "", "");
        for retailer in retailers {
            header.push_str(&format!("  {:>price_width$}", retailer));
            rule.push_str(&format!("  {:->price_width$}", ""));
        }
        header.push_str(&format!("  {:<12}  {:>8}", "Cheapest", "Savings"));
        rule.push_str(&format!("  {:-<12}  {:->8}", "", ""));
        lines.push(header);
        lines.push(rule);

        for c in comparisons {
            let mut row = format!("{:<ean_width$}  {:<name_width$}", c.ean, truncate(&c.name, name_width));
            for retailer in retailers {
                let price = c.price_at(retailer).map(|p| money(p.price)).unwrap_or_else(|| "-".to_string());
                row.push_str(&format!("  {:>price_width$}", price));
            }
            row.push_str(&format!("  {:<12}  {:>8}", c.cheapest_retailer, money(c.max_savings())));
            lines.push(row);
        }

        lines.push(String::new());
        lines.push(format!("Total: {} products", comparisons.len()));

        lines.join("\n")
    }

    fn table_history(&self, ean: &str, histories: &[RetailerHistory]) -> String {
        let mut lines = Vec::new();

        lines.push(format!("EAN:     {}", ean));
        lines.push(format!("Name:    {}", histories[0].name));

        for h in histories {
            lines.push(String::new());
            lines.push(format!("{} ({} points)", h.retailer, h.history.len()));
            for point in &h.history {
                let per_litre =
                    point.price_per_litre.map(|p| format!("  ({}/l)", money(p))).unwrap_or_default();
                lines.push(format!(
                    "  {}  {:>10}{}",
                    point.timestamp.format("%Y-%m-%d %H:%M"),
                    money(point.price),
                    per_litre
                ));
            }
        }

        lines.join("\n")
    }

    fn table_reports(&self, reports: &[ScrapeReport]) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{:<12}  {:>7}  {:>5}  {:>7}  {:>9}  {:>6}  {:>6}  {}",
            "Retailer", "Fetched", "New", "Changed", "Unchanged", "No EAN", "Stored", "Status"
        ));
        lines.push(format!(
            "{:-<12}  {:->7}  {:->5}  {:->7}  {:->9}  {:->6}  {:->6}  {:-<20}",
            "", "", "", "", "", "", "", ""
        ));

        for r in reports {
            lines.push(format!(
                "{:<12}  {:>7}  {:>5}  {:>7}  {:>9}  {:>6}  {:>6}  {}",
                r.retailer,
                r.fetched,
                r.summary.inserted,
                r.summary.price_changes,
                r.summary.unchanged,
                r.summary.skipped_no_identifier,
                r.store_size,
                r.status()
            ));
        }

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_comparisons(&self, retailers: &[&str], comparisons: &[Comparison]) -> String {
        let mut lines = Vec::new();

        let mut header = "| EAN | Name |".to_string();
        let mut rule = "|-----|------|".to_string();
        for retailer in retailers {
            header.push_str(&format!(" {} |", retailer));
            rule.push_str("------|");
        }
        header.push_str(" Cheapest | Savings |");
        rule.push_str("----------|---------|");
        lines.push(header);
        lines.push(rule);

        for c in comparisons {
            let mut row = format!("| {} | {} |", c.ean, Self::markdown_escape(&c.name));
            for retailer in retailers {
                match c.price_at(retailer) {
                    Some(p) if p.retailer == c.cheapest_retailer => {
                        row.push_str(&format!(" **{}** |", money(p.price)))
                    }
                    Some(p) => row.push_str(&format!(" {} |", money(p.price))),
                    None => row.push_str(" |"),
                }
            }
            let savings = match c.max_savings_percent() {
                Some(pct) => format!("{} ({}%)", money(c.max_savings()), pct),
                None => money(c.max_savings()),
            };
            row.push_str(&format!(" {} | {} |", c.cheapest_retailer, savings));
            lines.push(row);
        }

        lines.push(String::new());
        lines.push(format!("*{} products compared*", comparisons.len()));

        lines.join("\n")
    }

    fn markdown_history(&self, ean: &str, histories: &[RetailerHistory]) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {} ({})", Self::markdown_escape(&histories[0].name), ean));
        lines.push(String::new());
        lines.push("| Retailer | Date | Price | Price/L |".to_string());
        lines.push("|----------|------|-------|---------|".to_string());

        for h in histories {
            for point in &h.history {
                lines.push(format!(
                    "| {} | {} | {} | {} |",
                    h.retailer,
                    point.timestamp.format("%Y-%m-%d %H:%M"),
                    money(point.price),
                    point.price_per_litre.map(money).unwrap_or_default()
                ));
            }
        }

        lines.join("\n")
    }

    fn markdown_reports(&self, reports: &[ScrapeReport]) -> String {
        let mut lines = vec![
            "| Retailer | Fetched | New | Changed | Unchanged | No EAN | Stored | Status |".to_string(),
            "|----------|---------|-----|---------|-----------|--------|--------|--------|".to_string(),
        ];

        for r in reports {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} |",
                r.retailer,
                r.fetched,
                r.summary.inserted,
                r.summary.price_changes,
                r.summary.unchanged,
                r.summary.skipped_no_identifier,
                r.store_size,
                Self::markdown_escape(&r.status())
            ));
        }

        lines.join("\n")
    }

    // CSV formatting

    fn comparison_csv_header() -> &'static str {
        "ean,name,retailer,price,price_per_litre,difference,difference_percent,cheapest"
    }

    fn history_csv_header() -> &'static str {
        "ean,retailer,name,timestamp,price,price_per_litre"
    }

    /// One row per retailer price.
    fn csv_comparisons(&self, comparisons: &[Comparison]) -> String {
        let mut lines = vec![Self::comparison_csv_header().to_string()];

        for c in comparisons {
            let name = Self::csv_escape(&c.name);
            for p in &c.prices {
                lines.push(format!(
                    "{},{},{},{},{},{},{},{}",
                    c.ean,
                    name,
                    Self::csv_escape(&p.retailer),
                    p.price,
                    p.price_per_litre.map(|v| v.to_string()).unwrap_or_default(),
                    p.difference,
                    p.difference_percent.map(|v| v.to_string()).unwrap_or_default(),
                    p.retailer == c.cheapest_retailer
                ));
            }
        }

        lines.join("\n")
    }

    fn csv_history(&self, ean: &str, histories: &[RetailerHistory]) -> String {
        let mut lines = vec![Self::history_csv_header().to_string()];

        for h in histories {
            for point in &h.history {
                lines.push(format!(
                    "{},{},{},{},{},{}",
                    ean,
                    Self::csv_escape(&h.retailer),
                    Self::csv_escape(&h.name),
                    point.timestamp.to_rfc3339(),
                    point.price,
                    point.price_per_litre.map(|v| v.to_string()).unwrap_or_default()
                ));
            }
        }

        lines.join("\n")
    }

    fn csv_reports(&self, reports: &[ScrapeReport]) -> String {
        let mut lines = vec![
            "retailer,fetched,inserted,price_changes,unchanged,skipped_no_identifier,stored,data_file,error"
                .to_string(),
        ];

        for r in reports {
            lines.push(format!(
                "{},{},{},{},{},{},{},{},{}",
                Self::csv_escape(&r.retailer),
                r.fetched,
                r.summary.inserted,
                r.summary.price_changes,
                r.summary.unchanged,
                r.summary.skipped_no_identifier,
                r.store_size,
                Self::csv_escape(&r.data_file.display().to_string()),
                Self::csv_escape(r.error.as_deref().unwrap_or_default())
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }

    fn markdown_escape(s: &str) -> String {
        s.replace('|', "\\|")
    }
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// Truncates to `width` characters, marking the cut with `...`.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}
