//! report-cli: run one portfolio aggregation over a backend snapshot file and
//! print the result as JSON.
//!
//! Usage:
//!   cargo run -p report-cli -- report snapshot.json
//!   cargo run -p report-cli -- taxes taxes-2023.json --pretty
//!   cargo run -p report-cli -- annual annual.json --benchmark QQQ
//!   cargo run -p report-cli -- report snapshot.json --today 2024-01-02

use anyhow::{bail, Context, Result};
use portfolio_reports::{
    build_annual_report, build_options_report, build_portfolio_report, build_tax_report,
    parse_snapshot, AnnualSnapshot, BenchmarkIndex, OptionsSnapshot, ReportConfig, ReportSnapshot, TaxSnapshot,
};
use serde::Serialize;
use std::path::Path;

const USAGE: &str = "usage: report-cli <report|taxes|options|annual> <snapshot.json> \
                     [--pretty] [--today YYYY-MM-DD] [--benchmark SPY|QQQ]";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("report_cli=info,portfolio_reports=info,lot_engine=warn")
        });
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    // stdout carries the report; logs go to stderr.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}

fn option_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn load<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    parse_snapshot(&raw).with_context(|| format!("Failed to parse snapshot {}", path.display()))
}

fn print<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize report")?;
    println!("{}", out);
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let pretty = args.iter().any(|a| a == "--pretty");
    let (kind, path) = match (args.get(1), args.get(2)) {
        (Some(kind), Some(path)) if !path.starts_with("--") => (kind.as_str(), Path::new(path)),
        _ => bail!(USAGE),
    };

    let mut config = ReportConfig::from_env();
    if let Some(benchmark) = option_value(&args, "--benchmark") {
        config.benchmark = benchmark.parse::<BenchmarkIndex>().context("Invalid --benchmark")?;
    }
    let today = match option_value(&args, "--today") {
        Some(raw) => lot_engine::dates::parse_date(raw).context("Invalid --today")?,
        None => chrono::Local::now().date_naive(),
    };
    tracing::info!("Running {} on {} (benchmark {})", kind, path.display(), config.benchmark);

    match kind {
        "report" => {
            let snapshot: ReportSnapshot = load(path)?;
            print(&build_portfolio_report(&snapshot, today), pretty)
        }
        "taxes" => {
            let snapshot: TaxSnapshot = load(path)?;
            print(&build_tax_report(&snapshot), pretty)
        }
        "options" => {
            let snapshot: OptionsSnapshot = load(path)?;
            print(&build_options_report(&snapshot), pretty)
        }
        "annual" => {
            let snapshot: AnnualSnapshot = load(path)?;
            let report = build_annual_report(&snapshot, &config).context("Annual report failed")?;
            print(&report, pretty)
        }
        other => bail!("Unknown report kind '{}'\n{}", other, USAGE),
    }
}
