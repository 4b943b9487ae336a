//! Annualized yield of a symbol group from its dated cash flows.
//!
//! Each lot contributes its basis as a flow compounding from its purchase
//! date to the valuation date; return of capital and dividends flow back
//! out; the current market value closes the position at day 0. The root of
//! the resulting polynomial is the per-day growth factor.

use crate::dates::day_offset;
use crate::lot::Lot;
use crate::option::decode_option_symbol;
use crate::polynomial::Polynomial;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Values below this are treated as a closed position.
const MIN_POSITION_VALUE: f64 = 0.0001;

/// Factors at or above this magnitude are reported as infinite.
const INFINITE_FACTOR: f64 = 100.0;

pub const DAYS_PER_YEAR: i32 = 365;

fn exponent(days: i64) -> i32 {
    days.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Principal cash flows of a position, solved in two explicit phases:
/// price return first, then total return including dividends.
#[derive(Debug, Clone, Default)]
pub struct CashFlowBuilder {
    principal: Polynomial,
}

impl CashFlowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `amount` that has been compounding for `days`.
    pub fn add(&mut self, amount: f64, days: i64) {
        self.principal.append(amount, exponent(days));
    }

    pub fn principal(&self) -> &Polynomial {
        &self.principal
    }

    fn with_terminal(&self, terminal: f64) -> Polynomial {
        let mut poly = self.principal.clone();
        poly.append(terminal, 0);
        poly
    }

    /// Per-day factor from principal flows and the terminal value alone.
    pub fn solve_cash_return(&self, terminal: f64) -> f64 {
        self.with_terminal(terminal).solve()
    }

    /// Per-day factor once `extra` flows (dividends) are added on top of the
    /// same principal and terminal value.
    pub fn solve_total_return<I>(&self, terminal: f64, extra: I) -> f64
    where
        I: IntoIterator<Item = (f64, i64)>,
    {
        let mut poly = self.with_terminal(terminal);
        poly.extend(extra.into_iter().map(|(amount, days)| (amount, exponent(days))));
        poly.solve()
    }
}

/// `(factor^365 - 1) * 100`
pub fn annualized_percent(factor: f64) -> f64 {
    (factor.powi(DAYS_PER_YEAR) - 1.0) * 100.0
}

/// Change expressed by a growth factor, with the infinite cases split out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum PercentChange {
    Finite(f64),
    PlusInfinity,
    MinusInfinity,
}

impl PercentChange {
    /// `factor` of 1.1 is +10%. With `neg_base` (a short position) the sign
    /// is inverted. Non-finite factors and factors of magnitude 100 or more
    /// are infinite.
    pub fn from_factor(factor: f64, neg_base: bool) -> Self {
        if !factor.is_finite() || factor.abs() >= INFINITE_FACTOR {
            return if neg_base != (factor < 0.0) {
                PercentChange::MinusInfinity
            } else {
                PercentChange::PlusInfinity
            };
        }
        let mut change = factor - 1.0;
        if neg_base {
            change = -change;
        }
        PercentChange::Finite(change * 100.0)
    }

    pub fn is_infinite(&self) -> bool {
        !matches!(self, PercentChange::Finite(_))
    }
}

impl std::fmt::Display for PercentChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PercentChange::PlusInfinity => write!(f, "+\u{221e}"),
            PercentChange::MinusInfinity => write!(f, "-\u{221e}"),
            PercentChange::Finite(p) => {
                let s = format!("{:.2}", p);
                if s == "0.00" || s == "-0.00" {
                    write!(f, "unch.")
                } else if p > &0.0 {
                    write!(f, "+{}%", s)
                } else {
                    write!(f, "{}%", s)
                }
            }
        }
    }
}

/// Aggregate view of all lots of one symbol at a valuation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub symbol: String,
    pub total_shares: f64,
    /// Share-weighted days held.
    pub avg_days_held: f64,
    pub avg_purchase_price: f64,
    /// Basis net of return of capital.
    pub total_basis: f64,
    pub total_dividends: f64,
    pub quote: f64,
    pub old_quote: f64,
    pub current_value: f64,
    /// `(value + dividends) / basis`, mirrored as `2 - ratio` for net shorts.
    pub gain: f64,
    /// Per-day factor of the price return; 0 when undefined.
    pub yield1: f64,
    /// Per-day factor including dividends; 0 when undefined.
    pub yield2: f64,
    pub in_the_money: bool,
    pub time_value: f64,
}

impl GroupInfo {
    pub fn is_short(&self) -> bool {
        self.total_shares < 0.0
    }

    pub fn quote_change(&self) -> f64 {
        self.quote - self.old_quote
    }

    pub fn gain_change(&self) -> PercentChange {
        PercentChange::from_factor(self.gain, false)
    }

    /// Annualized total return, `None` when no yield could be solved.
    pub fn annual_return(&self) -> Option<PercentChange> {
        if self.yield2 == 0.0 {
            return None;
        }
        Some(PercentChange::from_factor(
            self.yield2.powi(DAYS_PER_YEAR),
            self.is_short(),
        ))
    }

    /// Annualized contribution of dividends in percent.
    pub fn dividend_yield_percent(&self) -> Option<f64> {
        if self.yield1 == 0.0 || self.total_dividends == 0.0 {
            return None;
        }
        Some(annualized_percent(self.yield2 / self.yield1))
    }
}

/// Compute the group view of `lots` (all of `symbol`) valued at `date`.
pub fn group_info(
    symbol: &str,
    lots: &[&Lot],
    date: NaiveDate,
    quotes: &HashMap<String, f64>,
    old_quotes: &HashMap<String, f64>,
) -> GroupInfo {
    let quote = quotes.get(symbol).copied().unwrap_or(0.0);
    let old_quote = old_quotes.get(symbol).copied().unwrap_or(0.0);
    let mut in_the_money = false;
    let mut time_value = quote;
    if let Some(contract) = decode_option_symbol(symbol) {
        let base_quote = quotes.get(&contract.underlying).copied().unwrap_or(0.0);
        in_the_money = contract.is_in_the_money(base_quote);
        time_value = contract.time_value(quote, base_quote);
    }

    let total_shares: f64 = lots.iter().map(|l| l.nshares).sum();
    // Net-short groups flip the sign of every flow.
    let sign = if total_shares > 0.0 {
        1.0
    } else if total_shares < 0.0 {
        -1.0
    } else {
        0.0
    };

    let mut flows = CashFlowBuilder::new();
    let mut total_basis = 0.0;
    let mut total_dividends = 0.0;
    let mut weighted_price = 0.0;
    let mut weighted_days = 0.0;
    for lot in lots {
        total_dividends += lot.total_dividends();
        let basis = lot.basis();
        let held = day_offset(lot.purchase_date, date);
        flows.add(sign * basis, held.saturating_add(lot.wash_days));
        let mut return_of_capital = 0.0;
        for r in &lot.return_of_capital {
            return_of_capital += r.amount;
            flows.add(-sign * r.amount, day_offset(r.date, date));
        }
        total_basis += basis - return_of_capital;
        weighted_price += lot.nshares * lot.share_price - return_of_capital;
        weighted_days += lot.nshares * held as f64;
    }

    let (avg_days_held, avg_purchase_price) = if total_shares != 0.0 {
        (weighted_days / total_shares, weighted_price / total_shares)
    } else {
        (0.0, 0.0)
    };
    let current_value = total_shares * quote;

    let mut yield1 = 0.0;
    let mut yield2 = 0.0;
    let opened_before = lots.last().map(|l| date > l.purchase_date).unwrap_or(false);
    if current_value.abs() > MIN_POSITION_VALUE && opened_before {
        let terminal = -sign * current_value;
        yield1 = flows.solve_cash_return(terminal);
        let dividends = lots.iter().flat_map(|lot| {
            lot.dividends
                .iter()
                .map(move |d| (-sign * d.amount, day_offset(d.date, date)))
        });
        yield2 = flows.solve_total_return(terminal, dividends);
        tracing::debug!(symbol, yield1, yield2, "Solved group yields");
    }

    let mut gain = (current_value + total_dividends) / total_basis;
    if total_shares < 0.0 {
        gain = 2.0 - gain;
    }

    GroupInfo {
        symbol: symbol.to_string(),
        total_shares,
        avg_days_held,
        avg_purchase_price,
        total_basis,
        total_dividends,
        quote,
        old_quote,
        current_value,
        gain,
        yield1,
        yield2,
        in_the_money,
        time_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lot::CashEvent;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn quotes(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(s, q)| (s.to_string(), *q)).collect()
    }

    #[test]
    fn test_single_lot_yield_matches_closed_form() {
        let lot = Lot::new("AAPL", 500.0, 100.0, d(2019, 1, 1));
        let info = group_info("AAPL", &[&lot], d(2020, 1, 1), &quotes(&[("AAPL", 150.0)]), &HashMap::new());
        let expected = 1.5_f64.powf(1.0 / 365.0);
        assert!((info.yield1 - expected).abs() < 1e-12);
        assert_eq!(info.yield1, info.yield2);
        assert!((annualized_percent(info.yield1) - 50.0).abs() < 1e-6);
        assert_eq!(info.current_value, 75000.0);
        assert_eq!(info.total_basis, 50000.0);
        assert!((info.gain - 1.5).abs() < 1e-12);
        assert_eq!(info.avg_days_held, 365.0);
        assert_eq!(info.avg_purchase_price, 100.0);
        assert!(info.dividend_yield_percent().is_none());
        match info.annual_return() {
            Some(PercentChange::Finite(p)) => assert!((p - 50.0).abs() < 1e-6),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dividends_only_in_second_phase() {
        let mut lot = Lot::new("KO", 100.0, 50.0, d(2019, 1, 1));
        lot.dividends = vec![
            CashEvent::new(d(2019, 4, 1), 40.0),
            CashEvent::new(d(2019, 10, 1), 40.0),
        ];
        let info = group_info("KO", &[&lot], d(2020, 1, 1), &quotes(&[("KO", 55.0)]), &HashMap::new());
        assert!((annualized_percent(info.yield1) - 10.0).abs() < 1e-6);
        assert!(info.yield2 > info.yield1);
        assert_eq!(info.total_dividends, 80.0);
        let div = info.dividend_yield_percent().unwrap();
        assert!(div > 1.0 && div < 2.0);
    }

    #[test]
    fn test_return_of_capital_reduces_basis() {
        let mut lot = Lot::new("MLP", 100.0, 20.0, d(2019, 1, 1));
        lot.return_of_capital = vec![CashEvent::new(d(2019, 7, 1), 100.0)];
        let info = group_info("MLP", &[&lot], d(2020, 1, 1), &quotes(&[("MLP", 20.0)]), &HashMap::new());
        assert_eq!(info.total_basis, 1900.0);
        assert_eq!(info.avg_purchase_price, 19.0);
        // Got 100 back and kept the full value: positive yield.
        assert!(info.yield1 > 1.0);
    }

    #[test]
    fn test_wash_days_lengthen_horizon() {
        let plain = Lot::new("AAPL", 10.0, 100.0, d(2019, 1, 1));
        let mut washed = plain.clone();
        washed.wash_days = 365;
        let q = quotes(&[("AAPL", 150.0)]);
        let a = group_info("AAPL", &[&plain], d(2020, 1, 1), &q, &HashMap::new());
        let b = group_info("AAPL", &[&washed], d(2020, 1, 1), &q, &HashMap::new());
        assert!(b.yield1 < a.yield1);
        assert!((b.yield1 - 1.5_f64.powf(1.0 / 730.0)).abs() < 1e-12);
    }

    #[test]
    fn test_short_position() {
        let lot = Lot::new("XYZ", -100.0, 50.0, d(2019, 1, 1));
        let info = group_info("XYZ", &[&lot], d(2020, 1, 1), &quotes(&[("XYZ", 40.0)]), &HashMap::new());
        assert!(info.is_short());
        // Borrowed at 50, worth 40 now: 20% profit on a short base.
        assert!((info.gain - 1.2).abs() < 1e-12);
        assert!((annualized_percent(info.yield1) - (-20.0)).abs() < 1e-6);
        match info.annual_return().unwrap() {
            PercentChange::Finite(p) => assert!((p - 20.0).abs() < 1e-6),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_groups_keep_zero_yield() {
        let q = quotes(&[("AAPL", 150.0)]);
        let opened_today = Lot::new("AAPL", 10.0, 100.0, d(2020, 1, 1));
        let info = group_info("AAPL", &[&opened_today], d(2020, 1, 1), &q, &HashMap::new());
        assert_eq!(info.yield1, 0.0);
        assert_eq!(info.yield2, 0.0);
        assert!(info.annual_return().is_none());

        let long = Lot::new("AAPL", 10.0, 100.0, d(2019, 1, 1));
        let short = Lot::new("AAPL", -10.0, 120.0, d(2019, 6, 1));
        let flat = group_info("AAPL", &[&long, &short], d(2020, 1, 1), &q, &HashMap::new());
        assert_eq!(flat.total_shares, 0.0);
        assert_eq!(flat.yield1, 0.0);
        assert_eq!(flat.avg_days_held, 0.0);
    }

    #[test]
    fn test_option_in_the_money() {
        let lot = Lot::new("AAPL230616C00150000", -1.0, 5.0, d(2023, 1, 3));
        let q = quotes(&[("AAPL230616C00150000", 12.0), ("AAPL", 160.0)]);
        let info = group_info("AAPL230616C00150000", &[&lot], d(2023, 3, 1), &q, &HashMap::new());
        assert!(info.in_the_money);
        assert!((info.time_value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(PercentChange::from_factor(f64::INFINITY, false), PercentChange::PlusInfinity);
        assert_eq!(PercentChange::from_factor(-150.0, false), PercentChange::MinusInfinity);
        assert_eq!(PercentChange::from_factor(150.0, true), PercentChange::MinusInfinity);
        assert_eq!(PercentChange::from_factor(f64::NAN, true), PercentChange::MinusInfinity);
        assert_eq!(PercentChange::from_factor(1.25, false), PercentChange::Finite(25.0));
        assert_eq!(PercentChange::from_factor(1.25, true), PercentChange::Finite(-25.0));
        assert_eq!(PercentChange::Finite(25.0).to_string(), "+25.00%");
        assert_eq!(PercentChange::Finite(-0.001).to_string(), "unch.");
        assert_eq!(PercentChange::MinusInfinity.to_string(), "-\u{221e}");
    }

    #[test]
    fn test_cash_flows_phases_are_independent() {
        let mut flows = CashFlowBuilder::new();
        flows.add(100.0, 365);
        let first = flows.solve_cash_return(-110.0);
        let total = flows.solve_total_return(-110.0, [(-5.0, 180)]);
        assert!(total > first);
        // Principal is untouched by either solve.
        assert_eq!(flows.principal().len(), 1);
        assert_eq!(flows.solve_cash_return(-110.0), first);
    }
}
