//! Portfolio Reports
//!
//! Aggregations over backend snapshots: the daily portfolio report, the tax
//! year report, option results and annual performance against a benchmark.

pub mod annual;
pub mod config;
pub mod error;
pub mod models;
pub mod options;
pub mod report;
pub mod taxes;


pub use annual::{build_annual_report, horizon_yield};
pub use config::{BenchmarkIndex, ReportConfig};
pub use error::{ReportError, ReportResult};
pub use models::*;
pub use options::build_options_report;
pub use report::build_portfolio_report;
pub use taxes::build_tax_report;

/// Parse a snapshot of any report kind from backend JSON.
pub fn parse_snapshot<T: serde::de::DeserializeOwned>(json: &str) -> ReportResult<T> {
    Ok(serde_json::from_str(json)?)
}
