//! Snapshot shapes as delivered by the portfolio backend, and the report
//! rows built from them.

use chrono::NaiveDate;
use lot_engine::dates::{serde_date, serde_opt_date};
use lot_engine::lot::serde_buckets;
use lot_engine::{CompletedLot, GroupInfo, Lot, PercentChange, TermTotals, WashSaleRestriction};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type Quotes = HashMap<String, f64>;

fn default_account() -> String {
    "all".to_string()
}

// ── Report ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountSnapshot {
    #[serde(default, alias = "buckets")]
    pub lots: Vec<Lot>,
    #[serde(default)]
    pub cash: f64,
    #[serde(default)]
    pub cash_diff: f64,
    #[serde(default)]
    pub cash_like: Option<f64>,
    #[serde(default)]
    pub cash_like_diff: Option<f64>,
    #[serde(default)]
    pub new_deposits: Option<f64>,
    /// Change from sales during the day; quote moves are added on top.
    #[serde(default)]
    pub equity_diff: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSnapshot {
    #[serde(default, with = "serde_opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de_opt_year")]
    pub year: Option<i32>,
    #[serde(default = "default_account")]
    pub account: String,
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountSnapshot>,
    #[serde(default)]
    pub quotes: Quotes,
    #[serde(default)]
    pub oldquotes: Quotes,
    #[serde(default)]
    pub yearquotes: Option<Quotes>,
}

/// One symbol of an account report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRow {
    #[serde(flatten)]
    pub info: GroupInfo,
    pub lot_count: usize,
    pub is_option: bool,
    /// Share of the account's equity in percent.
    pub equity_percent: f64,
    /// Average holding time, `42d` or `1.5y`.
    pub held: String,
    pub quote_change: f64,
    pub gain_change: PercentChange,
    /// Annualized total return; absent when no yield could be solved.
    pub annual_return: Option<PercentChange>,
    /// Annualized percent contributed by dividends.
    pub dividend_yield: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountTotals {
    pub cash: f64,
    pub cash_diff: f64,
    pub equity: f64,
    pub equity_diff: f64,
    /// Cash reserved for short puts.
    pub put_hold: f64,
    pub total_value: f64,
    pub total_diff: f64,
    /// `total / (total - diff)`, when that base is positive.
    pub total_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpDown {
    /// Net shares per effective symbol.
    pub nshares: BTreeMap<String, f64>,
    pub up_amount: f64,
    pub down_amount: f64,
    pub up_percent: i64,
    pub down_percent: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountReport {
    pub name: String,
    pub has_options: bool,
    pub groups: Vec<GroupRow>,
    pub totals: AccountTotals,
    pub up_down: UpDown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioReport {
    #[serde(with = "serde_date")]
    pub date: NaiveDate,
    pub year: Option<i32>,
    pub account: String,
    pub accounts: Vec<AccountReport>,
}

// ── Taxes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxSnapshot {
    #[serde(deserialize_with = "de_year")]
    pub year: i32,
    #[serde(default = "default_account")]
    pub account: String,
    #[serde(default, alias = "buckets")]
    pub lots: Vec<Lot>,
    #[serde(default)]
    pub completed_lots: Vec<CompletedLot>,
    /// Legacy bucket records, converted to the lot convention on load.
    #[serde(default, deserialize_with = "serde_buckets::deserialize", skip_serializing)]
    pub completed_buckets: Vec<CompletedLot>,
    #[serde(default)]
    pub dividend: BTreeMap<String, f64>,
    #[serde(default)]
    pub quotes: Quotes,
}

impl TaxSnapshot {
    /// Realized lots from both record shapes.
    pub fn realized_lots(&self) -> Vec<CompletedLot> {
        self.completed_lots
            .iter()
            .chain(&self.completed_buckets)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRow {
    pub symbol: String,
    pub nshares: f64,
    /// Holding start, moved back by inherited wash sale days.
    #[serde(with = "serde_date")]
    pub start_date: NaiveDate,
    #[serde(default, with = "serde_opt_date")]
    pub end_date: Option<NaiveDate>,
    pub start_share_price: f64,
    pub end_share_price: f64,
    pub basis: f64,
    pub amount: f64,
    pub gain: f64,
    /// Disallowed loss of the whole lot, 0 when none.
    pub wash_sale: f64,
    pub account: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxGroup {
    pub symbol: String,
    pub rows: Vec<TaxRow>,
    pub total_gain: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxSection {
    pub short_term: Vec<TaxGroup>,
    pub long_term: Vec<TaxGroup>,
    pub totals: TermTotals,
    pub has_wash_sale: bool,
}

impl TaxSection {
    pub fn is_empty(&self) -> bool {
        self.short_term.is_empty() && self.long_term.is_empty()
    }

    /// Grand total is shown only when both terms are present.
    pub fn has_both_terms(&self) -> bool {
        !self.short_term.is_empty() && !self.long_term.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendSummary {
    pub rows: Vec<(String, f64)>,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxReport {
    pub year: i32,
    pub account: String,
    pub realized: TaxSection,
    /// Open lots valued at the end of the tax year.
    pub pending: TaxSection,
    pub dividends: DividendSummary,
    pub wash_sale_restrictions: Vec<WashSaleRestriction>,
}

// ── Options ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsSnapshot {
    #[serde(default, with = "serde_opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(default = "default_account")]
    pub account: String,
    #[serde(default)]
    pub completed_lots: Vec<CompletedLot>,
    #[serde(default, deserialize_with = "serde_buckets::deserialize", skip_serializing)]
    pub completed_buckets: Vec<CompletedLot>,
    #[serde(default)]
    pub assigned_lots: Vec<CompletedLot>,
    #[serde(default, deserialize_with = "serde_buckets::deserialize", skip_serializing)]
    pub assigned_buckets: Vec<CompletedLot>,
    #[serde(default, alias = "buckets")]
    pub lots: Vec<Lot>,
    #[serde(default)]
    pub quotes: Quotes,
    /// Quotes on assignment dates, keyed by ISO date.
    #[serde(default)]
    pub historical_quotes: HashMap<String, Quotes>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionRow {
    pub symbol: String,
    pub nshares: f64,
    #[serde(with = "serde_date")]
    pub start_date: NaiveDate,
    #[serde(default, with = "serde_opt_date")]
    pub end_date: Option<NaiveDate>,
    pub start_share_price: f64,
    pub end_share_price: f64,
    /// Underlying quote minus strike at assignment.
    pub stock: Option<f64>,
    pub gain: f64,
    pub unrealized: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionGroup {
    pub underlying: String,
    pub rows: Vec<OptionRow>,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsReport {
    #[serde(default, with = "serde_opt_date")]
    pub date: Option<NaiveDate>,
    pub account: String,
    pub groups: Vec<OptionGroup>,
    pub grand_total: f64,
}

// ── Annual ──────────────────────────────────────────────────────────

/// Only symbol and share count matter for year-end equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub nshares: f64,
}

/// State of an account at the end of one calendar year. `start` and `end`
/// are day numbers counted from 1970-01-01.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSnapshot {
    pub year: i32,
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub cash: f64,
    #[serde(default, alias = "buckets")]
    pub lots: Vec<Holding>,
}

/// `(day number, amount)`
pub type DatedAmount = (i64, f64);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountHistory {
    #[serde(default)]
    pub years: Vec<YearSnapshot>,
    #[serde(default)]
    pub deposits: Vec<DatedAmount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnualSnapshot {
    #[serde(default = "default_account")]
    pub account: String,
    /// Single-account shape.
    #[serde(default)]
    pub years: Vec<YearSnapshot>,
    #[serde(default)]
    pub deposits: Vec<DatedAmount>,
    /// Multi-account shape.
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountHistory>,
    /// Year-end quotes by year.
    #[serde(default)]
    pub quotes: BTreeMap<i32, Quotes>,
    #[serde(default)]
    pub index_dividends: HashMap<String, Vec<DatedAmount>>,
}

impl AnnualSnapshot {
    /// Every account history sorted by name. Top-level `years`/`deposits`
    /// form one more account named after `account`.
    pub fn account_histories(&self) -> Vec<(String, AccountHistory)> {
        let mut histories: BTreeMap<String, AccountHistory> = self.accounts.clone();
        if !self.years.is_empty() {
            histories.insert(
                self.account.clone(),
                AccountHistory {
                    years: self.years.clone(),
                    deposits: self.deposits.clone(),
                },
            );
        }
        histories.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonYield {
    pub years: u32,
    /// Growth over the horizon, capped at one year, minus 1.
    pub account: f64,
    pub benchmark: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualRow {
    pub year: i32,
    pub deposits: f64,
    pub cash: f64,
    pub equity: f64,
    pub yields: Vec<HorizonYield>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPerformance {
    pub account: String,
    pub rows: Vec<AnnualRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualReport {
    pub benchmark: String,
    pub accounts: Vec<AccountPerformance>,
}

// ── serde helpers ───────────────────────────────────────────────────

/// Years arrive as numbers or as query-string text.
#[derive(Deserialize)]
#[serde(untagged)]
enum YearValue {
    Number(i32),
    Text(String),
}

fn year_from(value: YearValue) -> Result<i32, String> {
    match value {
        YearValue::Number(y) => Ok(y),
        YearValue::Text(s) => s.trim().parse().map_err(|_| format!("invalid year: {}", s)),
    }
}

fn de_year<'de, D: serde::Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    year_from(YearValue::deserialize(d)?).map_err(serde::de::Error::custom)
}

fn de_opt_year<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    match Option::<YearValue>::deserialize(d)? {
        None => Ok(None),
        Some(YearValue::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => year_from(v).map(Some).map_err(serde::de::Error::custom),
    }
}
