//! Lot records and grouping.
//!
//! A [`Lot`] is an open position slice. A [`CompletedLot`] pairs a lot with
//! either a closing sale or a quote (mark-to-market); the same record serves
//! realized sales, assigned options and valued open positions.

use crate::dates::{self, serde_date, serde_opt_date};
use crate::option::{decode_option_symbol, effective_symbol};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A dated amount. Amounts are totals for the lot, not per share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashEvent {
    #[serde(with = "serde_date")]
    pub date: NaiveDate,
    pub amount: f64,
}

impl CashEvent {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// An open tax lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub symbol: String,
    /// Negative for short positions.
    pub nshares: f64,
    #[serde(with = "serde_date")]
    pub purchase_date: NaiveDate,
    pub share_price: f64,
    #[serde(default)]
    pub share_adj: f64,
    #[serde(default)]
    pub share_expense: f64,
    /// Holding period inherited from a wash-sale predecessor.
    #[serde(default)]
    pub wash_days: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dividends: Vec<CashEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub return_of_capital: Vec<CashEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl Lot {
    pub fn new(symbol: impl Into<String>, nshares: f64, share_price: f64, purchase_date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            nshares,
            purchase_date,
            share_price,
            share_adj: 0.0,
            share_expense: 0.0,
            wash_days: 0,
            dividends: Vec::new(),
            return_of_capital: Vec::new(),
            account: None,
        }
    }

    /// Cost basis including adjustments and expenses.
    pub fn basis(&self) -> f64 {
        self.nshares * (self.share_price + self.share_adj) + self.nshares.abs() * self.share_expense
    }

    pub fn total_dividends(&self) -> f64 {
        self.dividends.iter().map(|d| d.amount).sum()
    }

    /// Start of the holding period used for long/short-term classification.
    pub fn holding_start(&self) -> NaiveDate {
        dates::add_days(self.purchase_date, self.wash_days.saturating_neg())
    }

    pub fn is_option(&self) -> bool {
        decode_option_symbol(&self.symbol).is_some()
    }
}

/// A lot closed by a sale or valued against a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedLot {
    pub symbol: String,
    pub nshares: f64,
    #[serde(with = "serde_date")]
    pub start_date: NaiveDate,
    /// `None` for an open position that has not been valued yet.
    #[serde(default, with = "serde_opt_date", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_share_price: f64,
    #[serde(default)]
    pub end_share_price: f64,
    #[serde(default)]
    pub start_share_adj: f64,
    #[serde(default)]
    pub start_share_expense: f64,
    #[serde(default)]
    pub end_share_adj: f64,
    #[serde(default)]
    pub end_share_expense: f64,
    /// Disallowed loss per share, already folded into `end_share_adj`.
    #[serde(default)]
    pub wash_sale: f64,
    #[serde(default)]
    pub wash_days: i64,
    /// Option closed by assignment or exercise.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub assigned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl CompletedLot {
    /// Value an open lot at `end_date` using `quotes` (missing quote -> 0).
    pub fn mark_to_market(lot: &Lot, quotes: &HashMap<String, f64>, end_date: Option<NaiveDate>) -> Self {
        Self {
            symbol: lot.symbol.clone(),
            nshares: lot.nshares,
            start_date: lot.purchase_date,
            end_date,
            start_share_price: lot.share_price,
            end_share_price: quotes.get(&lot.symbol).copied().unwrap_or(0.0),
            start_share_adj: lot.share_adj,
            start_share_expense: lot.share_expense,
            end_share_adj: 0.0,
            end_share_expense: 0.0,
            wash_sale: 0.0,
            wash_days: lot.wash_days,
            assigned: false,
            account: lot.account.clone(),
        }
    }

    pub fn holding_start(&self) -> NaiveDate {
        dates::add_days(self.start_date, self.wash_days.saturating_neg())
    }

    /// Convert a legacy bucket record, whose `wash_sale` is the disallowed
    /// loss of the whole lot and is not yet part of `end_share_adj`.
    pub fn from_bucket(mut self) -> Self {
        if self.nshares != 0.0 && self.wash_sale != 0.0 {
            self.end_share_adj -= self.wash_sale / self.nshares.abs();
            self.wash_sale /= self.nshares;
        }
        self
    }

    /// Long-term holding counted from the wash-sale adjusted start.
    pub fn is_long_term(&self) -> bool {
        match self.end_date {
            Some(end) => dates::is_long_term(self.nshares, self.holding_start(), end),
            None => false,
        }
    }

    pub fn is_option(&self) -> bool {
        decode_option_symbol(&self.symbol).is_some()
    }
}

/// Value every open lot at `end_date`.
pub fn complete_unrealized(
    lots: &[Lot],
    quotes: &HashMap<String, f64>,
    end_date: Option<NaiveDate>,
) -> Vec<CompletedLot> {
    lots.iter()
        .map(|lot| CompletedLot::mark_to_market(lot, quotes, end_date))
        .collect()
}

/// Serde adapter for lists of legacy bucket records.
pub mod serde_buckets {
    use super::CompletedLot;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<CompletedLot>, D::Error> {
        let buckets = Vec::<CompletedLot>::deserialize(d)?;
        Ok(buckets.into_iter().map(CompletedLot::from_bucket).collect())
    }
}

/// Anything carrying a symbol that can be grouped.
pub trait Symbolic {
    fn symbol(&self) -> &str;
}

impl Symbolic for Lot {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Symbolic for CompletedLot {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

/// Records grouped by exact symbol; groups and members keep insertion order.
#[derive(Debug, Clone)]
pub struct SymbolGroups<'a, T> {
    index: HashMap<&'a str, usize>,
    groups: Vec<(String, Vec<&'a T>)>,
}

impl<'a, T> SymbolGroups<'a, T> {
    pub fn get(&self, symbol: &str) -> Option<&[&'a T]> {
        let &i = self.index.get(symbol)?;
        Some(self.groups[i].1.as_slice())
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(s, _)| s.as_str())
    }

    /// Symbols in lexicographic order.
    pub fn sorted_symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.symbols().collect();
        symbols.sort_unstable();
        symbols
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[&'a T])> {
        self.groups.iter().map(|(s, m)| (s.as_str(), m.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

pub fn group_by_symbol<T: Symbolic>(records: &[T]) -> SymbolGroups<'_, T> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&T>)> = Vec::new();
    for record in records {
        let symbol = record.symbol();
        match index.get(symbol) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(symbol, groups.len());
                groups.push((symbol.to_string(), vec![record]));
            }
        }
    }
    SymbolGroups { index, groups }
}

/// Distinct symbols with options replaced by their underlying, sorted.
pub fn collect_underlying_symbols<T: Symbolic>(records: &[T]) -> Vec<String> {
    records
        .iter()
        .map(|r| effective_symbol(r.symbol()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
