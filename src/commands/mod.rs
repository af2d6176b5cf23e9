//! CLI command implementations.

pub mod compare;
pub mod history;
pub mod run;
pub mod scrape;

pub use compare::CompareCommand;
pub use history::HistoryCommand;
pub use run::{RunCommand, RunOutcome};
pub use scrape::{ScrapeCommand, ScrapeReport};
