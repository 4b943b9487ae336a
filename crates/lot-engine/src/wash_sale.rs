//! Wash Sale Restrictions
//!
//! Stock sold at a loss may not be bought back inside the wash sale window
//! without the loss being disallowed. Only closures present in the supplied
//! lots are seen, so sales in other accounts are not detected.

use crate::dates::{add_days, day_offset};
use crate::gain::LotTotal;
use crate::lot::CompletedLot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Days after a loss sale before the symbol can be repurchased safely.
pub const WASH_SALE_WINDOW_DAYS: i64 = 31;

/// Status of a symbol on a given date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WashSaleStatus {
    /// Safe to buy back
    Safe,
    /// A repurchase would be a wash sale
    InWindow,
}

impl std::fmt::Display for WashSaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WashSaleStatus::Safe => write!(f, "Safe"),
            WashSaleStatus::InWindow => write!(f, "In Window"),
        }
    }
}

/// Repurchase restriction created by the latest loss sale of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WashSaleRestriction {
    pub symbol: String,
    /// Latest sale of the symbol at a loss
    #[serde(with = "crate::dates::serde_date")]
    pub last_loss_date: NaiveDate,
    /// First day a repurchase no longer washes the loss
    #[serde(with = "crate::dates::serde_date")]
    pub restriction_end: NaiveDate,
}

impl WashSaleRestriction {
    pub fn new(symbol: impl Into<String>, last_loss_date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            last_loss_date,
            restriction_end: add_days(last_loss_date, WASH_SALE_WINDOW_DAYS),
        }
    }

    pub fn is_active(&self, as_of: NaiveDate) -> bool {
        as_of < self.restriction_end
    }

    pub fn status(&self, as_of: NaiveDate) -> WashSaleStatus {
        if self.is_active(as_of) {
            WashSaleStatus::InWindow
        } else {
            WashSaleStatus::Safe
        }
    }

    /// Days until the restriction lifts
    pub fn days_remaining(&self, as_of: NaiveDate) -> i64 {
        day_offset(as_of, self.restriction_end).max(0)
    }
}

/// One restriction per stock symbol with a long lot closed at a loss,
/// sorted by symbol. Options and short lots are ignored.
pub fn wash_sale_restrictions(completed: &[CompletedLot]) -> Vec<WashSaleRestriction> {
    let mut latest: BTreeMap<&str, NaiveDate> = BTreeMap::new();
    for lot in completed {
        if lot.nshares < 0.0 || lot.is_option() {
            continue;
        }
        let end = match lot.end_date {
            Some(end) => end,
            None => continue,
        };
        if !LotTotal::of(lot).is_loss() {
            continue;
        }
        let entry = latest.entry(lot.symbol.as_str()).or_insert(end);
        if end > *entry {
            *entry = end;
        }
    }

    latest
        .into_iter()
        .map(|(symbol, date)| WashSaleRestriction::new(symbol, date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sold(symbol: &str, nshares: f64, start: f64, end: f64, end_date: NaiveDate) -> CompletedLot {
        CompletedLot {
            symbol: symbol.to_string(),
            nshares,
            start_date: d(2022, 1, 3),
            end_date: Some(end_date),
            start_share_price: start,
            end_share_price: end,
            start_share_adj: 0.0,
            start_share_expense: 0.0,
            end_share_adj: 0.0,
            end_share_expense: 0.0,
            wash_sale: 0.0,
            wash_days: 0,
            assigned: false,
            account: None,
        }
    }

    #[test]
    fn test_window_crosses_month() {
        let lots = vec![sold("AAPL", 10.0, 150.0, 140.0, d(2023, 3, 1))];
        let restrictions = wash_sale_restrictions(&lots);
        assert_eq!(restrictions.len(), 1);
        assert_eq!(restrictions[0].restriction_end, d(2023, 4, 1));
    }

    #[test]
    fn test_latest_loss_wins_and_gains_ignored() {
        let lots = vec![
            sold("MSFT", 5.0, 300.0, 250.0, d(2023, 2, 1)),
            sold("MSFT", 5.0, 300.0, 280.0, d(2023, 5, 10)),
            sold("MSFT", 5.0, 200.0, 320.0, d(2023, 6, 1)),
            sold("AAPL", 5.0, 100.0, 90.0, d(2023, 1, 15)),
        ];
        let restrictions = wash_sale_restrictions(&lots);
        assert_eq!(restrictions.len(), 2);
        assert_eq!(restrictions[0].symbol, "AAPL");
        assert_eq!(restrictions[1].symbol, "MSFT");
        assert_eq!(restrictions[1].last_loss_date, d(2023, 5, 10));
        assert_eq!(restrictions[1].restriction_end, d(2023, 6, 10));
    }

    #[test]
    fn test_options_and_shorts_skipped() {
        let lots = vec![
            sold("AAPL230616C00150000", 1.0, 5.0, 1.0, d(2023, 3, 1)),
            // Short covered higher than it was sold: a loss, but not tracked.
            sold("TSLA", -10.0, 100.0, 120.0, d(2023, 3, 1)),
        ];
        assert!(wash_sale_restrictions(&lots).is_empty());
    }

    #[test]
    fn test_status_and_days_remaining() {
        let r = WashSaleRestriction::new("AAPL", d(2023, 3, 1));
        assert_eq!(r.status(d(2023, 3, 15)), WashSaleStatus::InWindow);
        assert_eq!(r.days_remaining(d(2023, 3, 15)), 17);
        assert!(!r.is_active(d(2023, 4, 1)));
        assert_eq!(r.days_remaining(d(2023, 5, 1)), 0);
        assert_eq!(r.status(d(2023, 5, 1)), WashSaleStatus::Safe);
    }
}
