//! Year-by-year account performance over trailing horizons, next to the
//! same horizons for a benchmark index.

use crate::config::{BenchmarkIndex, ReportConfig};
use crate::error::{ReportError, ReportResult};
use crate::models::*;
use lot_engine::yield_engine::DAYS_PER_YEAR;
use lot_engine::Polynomial;

/// Account state carried from one year-end to the next.
#[derive(Debug, Clone, Copy)]
struct YearEnd {
    total: f64,
    end: i64,
    index_quote: Option<f64>,
}

fn day_exponent(days: i64) -> i32 {
    i32::try_from(days).unwrap_or(if days < 0 { i32::MIN } else { i32::MAX })
}

/// Growth factor of the flows in `poly` ending at `equity + cash`, over at
/// most one year.
///
/// A closed account (`equity == 0`) is measured from its first flow rather
/// than from the horizon start. Returns 1 when the flows span no time.
pub fn horizon_yield(mut poly: Polynomial, equity: f64, cash: f64) -> f64 {
    let mut max_day = poly.max_exponent().unwrap_or(0).max(0);
    if let Some(min_day) = poly.min_exponent() {
        if equity == 0.0 && min_day > 0 {
            poly.shift_exponents(min_day);
            max_day -= min_day;
        }
    }
    poly.append(-(equity + cash), 0);
    let days = max_day.min(DAYS_PER_YEAR);
    if days == 0 {
        return 1.0;
    }
    poly.solve().powi(days)
}

/// Index quote of a year, falling back to the legacy ticker. Zero quotes
/// count as missing.
pub fn benchmark_quote(quotes: &Quotes, benchmark: BenchmarkIndex) -> Option<f64> {
    let lookup = |symbol: &str| quotes.get(symbol).copied().filter(|q| *q != 0.0);
    lookup(benchmark.symbol()).or_else(|| benchmark.legacy_symbol().and_then(lookup))
}

pub fn build_annual_report(snapshot: &AnnualSnapshot, config: &ReportConfig) -> ReportResult<AnnualReport> {
    let index_dividends: &[DatedAmount] = snapshot
        .index_dividends
        .get(config.benchmark.symbol())
        .map(|d| d.as_slice())
        .unwrap_or(&[]);

    let mut accounts = Vec::new();
    for (name, history) in snapshot.account_histories() {
        validate_history(&name, &history)?;
        accounts.push(account_performance(&name, &history, snapshot, index_dividends, config));
    }
    tracing::info!(
        "Built annual report for {} accounts against {}",
        accounts.len(),
        config.benchmark
    );

    Ok(AnnualReport {
        benchmark: config.benchmark.to_string(),
        accounts,
    })
}

fn validate_history(name: &str, history: &AccountHistory) -> ReportResult<()> {
    let mut prev_end = i64::MIN;
    for year in &history.years {
        if year.end < year.start {
            return Err(ReportError::InvalidSnapshot(format!(
                "{}: year {} ends before it starts",
                name, year.year
            )));
        }
        if year.end <= prev_end {
            return Err(ReportError::InvalidSnapshot(format!(
                "{}: year {} is out of order",
                name, year.year
            )));
        }
        prev_end = year.end;
    }
    Ok(())
}

fn account_performance(
    name: &str,
    history: &AccountHistory,
    snapshot: &AnnualSnapshot,
    index_dividends: &[DatedAmount],
    config: &ReportConfig,
) -> AccountPerformance {
    let no_quotes = Quotes::new();
    let mut year_ends: Vec<YearEnd> = Vec::new();
    let mut rows = Vec::new();

    for year in history.years.iter().filter(|y| y.year >= config.first_annual_year) {
        let quotes = snapshot.quotes.get(&year.year).unwrap_or(&no_quotes);
        let equity: f64 = year
            .lots
            .iter()
            .map(|h| h.nshares * quotes.get(&h.symbol).copied().unwrap_or(0.0))
            .sum();
        let index_quote = benchmark_quote(quotes, config.benchmark);

        let mut yields = Vec::new();
        for &horizon in &config.horizons {
            let n = horizon as usize;
            if year_ends.len() < n {
                continue;
            }
            let start = year_ends[year_ends.len() - n];

            let mut poly = Polynomial::new();
            if start.total != 0.0 {
                poly.append(start.total, day_exponent(year.end.saturating_sub(start.end)));
            }
            for &(day, amount) in &history.deposits {
                if day > start.end && day <= year.end {
                    poly.append(amount, day_exponent(year.end.saturating_sub(day)));
                }
            }
            let account = horizon_yield(poly, equity, year.cash) - 1.0;

            let benchmark = match (index_quote, start.index_quote) {
                (Some(quote), Some(prev_quote)) => {
                    let mut index_poly = Polynomial::new();
                    index_poly.append(prev_quote, day_exponent(year.end.saturating_sub(start.end)));
                    for &(day, amount) in index_dividends {
                        if day > start.end && day <= year.end {
                            index_poly.append(-amount, day_exponent(year.end.saturating_sub(day)));
                        }
                    }
                    Some(horizon_yield(index_poly, quote, 0.0) - 1.0)
                }
                _ => None,
            };

            yields.push(HorizonYield {
                years: horizon,
                account,
                benchmark,
            });
        }

        let deposits: f64 = history
            .deposits
            .iter()
            .filter(|(day, _)| *day >= year.start && *day <= year.end)
            .map(|(_, amount)| amount)
            .sum();

        rows.push(AnnualRow {
            year: year.year,
            deposits,
            cash: year.cash,
            equity,
            yields,
        });
        year_ends.push(YearEnd {
            total: equity + year.cash,
            end: year.end,
            index_quote,
        });
    }
    tracing::debug!("{}: {} annual rows", name, rows.len());

    AccountPerformance {
        account: name.to_string(),
        rows,
    }
}
