//! Gain / basis of completed lots and holding-period classification.

use crate::lot::CompletedLot;
use serde::{Deserialize, Serialize};

/// Holding period classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HoldingPeriod {
    ShortTerm,
    LongTerm,
}

impl HoldingPeriod {
    pub fn of(lot: &CompletedLot) -> Self {
        if lot.is_long_term() {
            HoldingPeriod::LongTerm
        } else {
            HoldingPeriod::ShortTerm
        }
    }
}

impl std::fmt::Display for HoldingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HoldingPeriod::ShortTerm => write!(f, "Short-term"),
            HoldingPeriod::LongTerm => write!(f, "Long-term"),
        }
    }
}

/// Type of gain/loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GainType {
    ShortTermGain,
    ShortTermLoss,
    LongTermGain,
    LongTermLoss,
}

impl GainType {
    pub fn is_loss(&self) -> bool {
        matches!(self, GainType::ShortTermLoss | GainType::LongTermLoss)
    }

    pub fn is_long_term(&self) -> bool {
        matches!(self, GainType::LongTermGain | GainType::LongTermLoss)
    }
}

/// Proceeds, basis and gain of one completed lot.
///
/// The wash-sale disallowed loss is carried in `end_share_adj`, so `gain` is
/// plain `amount - basis`; `CompletedLot::wash_sale` is informational only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LotTotal {
    pub amount: f64,
    pub basis: f64,
    pub gain: f64,
}

impl LotTotal {
    pub fn of(lot: &CompletedLot) -> Self {
        let n = lot.nshares;
        let amount = n * lot.end_share_price - n.abs() * (lot.end_share_adj + lot.end_share_expense);
        let basis = n * lot.start_share_price + n.abs() * (lot.start_share_adj + lot.start_share_expense);
        Self {
            amount,
            basis,
            gain: amount - basis,
        }
    }

    pub fn is_loss(&self) -> bool {
        self.amount < self.basis
    }
}

/// Classify a completed lot's result.
pub fn gain_type(lot: &CompletedLot) -> GainType {
    let total = LotTotal::of(lot);
    match (total.gain >= 0.0, HoldingPeriod::of(lot)) {
        (true, HoldingPeriod::LongTerm) => GainType::LongTermGain,
        (true, HoldingPeriod::ShortTerm) => GainType::ShortTermGain,
        (false, HoldingPeriod::LongTerm) => GainType::LongTermLoss,
        (false, HoldingPeriod::ShortTerm) => GainType::ShortTermLoss,
    }
}

/// Disallowed wash-sale loss for the whole lot.
pub fn disallowed_wash_sale(lot: &CompletedLot) -> f64 {
    lot.wash_sale * lot.nshares
}

/// Gains summed per holding period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TermTotals {
    pub short_term: f64,
    pub long_term: f64,
}

impl TermTotals {
    pub fn add(&mut self, lot: &CompletedLot) {
        let gain = LotTotal::of(lot).gain;
        match HoldingPeriod::of(lot) {
            HoldingPeriod::ShortTerm => self.short_term += gain,
            HoldingPeriod::LongTerm => self.long_term += gain,
        }
    }

    pub fn get(&self, period: HoldingPeriod) -> f64 {
        match period {
            HoldingPeriod::ShortTerm => self.short_term,
            HoldingPeriod::LongTerm => self.long_term,
        }
    }

    pub fn grand_total(&self) -> f64 {
        self.short_term + self.long_term
    }
}

impl<'a> FromIterator<&'a CompletedLot> for TermTotals {
    fn from_iter<I: IntoIterator<Item = &'a CompletedLot>>(iter: I) -> Self {
        let mut totals = TermTotals::default();
        for lot in iter {
            totals.add(lot);
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn completed(nshares: f64, start: f64, end: f64, start_date: &str, end_date: &str) -> CompletedLot {
        CompletedLot {
            symbol: "AAPL".to_string(),
            nshares,
            start_date: NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap(),
            end_date: Some(NaiveDate::parse_from_str(end_date, "%Y-%m-%d").unwrap()),
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
    fn test_simple_gain() {
        let lot = completed(10.0, 100.0, 110.0, "2020-01-01", "2020-06-01");
        let total = LotTotal::of(&lot);
        assert_eq!(total.amount, 1100.0);
        assert_eq!(total.basis, 1000.0);
        assert_eq!(total.gain, 100.0);
        assert_eq!(gain_type(&lot), GainType::ShortTermGain);
    }

    #[test]
    fn test_short_position_gain() {
        // Sold short at 110, bought back at 100.
        let lot = completed(-10.0, 110.0, 100.0, "2020-01-01", "2022-06-01");
        let total = LotTotal::of(&lot);
        assert_eq!(total.gain, 100.0);
        assert_eq!(gain_type(&lot), GainType::ShortTermGain);
    }

    #[test]
    fn test_adjustments_and_wash_sale_not_double_counted() {
        // 200 calls from the wash sale ledger: loss moved into end_share_adj.
        let mut lot = completed(200.0, 14.73, 10.0, "2012-02-29", "2012-03-05");
        lot.start_share_expense = 0.03745;
        lot.end_share_expense = 0.03756667;
        lot.end_share_adj = -4.805;
        lot.wash_sale = 4.805;
        let total = LotTotal::of(&lot);
        // (2000 - 7.513334 + 961) - (2946 + 7.49)
        assert!((total.gain - (-0.003334)).abs() < 1e-4);
        assert!((disallowed_wash_sale(&lot) - 961.0).abs() < 1e-9);
    }

    #[test]
    fn test_wash_days_extend_holding_period() {
        let mut lot = completed(10.0, 100.0, 90.0, "2021-01-10", "2022-01-05");
        assert_eq!(HoldingPeriod::of(&lot), HoldingPeriod::ShortTerm);
        lot.wash_days = 10;
        assert_eq!(HoldingPeriod::of(&lot), HoldingPeriod::LongTerm);
        assert_eq!(gain_type(&lot), GainType::LongTermLoss);
        assert!(gain_type(&lot).is_loss());
    }

    #[test]
    fn test_term_totals() {
        let lots = vec![
            completed(10.0, 100.0, 110.0, "2020-01-01", "2020-06-01"),
            completed(10.0, 100.0, 90.0, "2019-01-01", "2020-06-01"),
            completed(5.0, 10.0, 30.0, "2020-02-01", "2020-06-01"),
        ];
        let totals: TermTotals = lots.iter().collect();
        assert_eq!(totals.short_term, 200.0);
        assert_eq!(totals.long_term, -100.0);
        assert_eq!(totals.grand_total(), 100.0);
        assert_eq!(totals.get(HoldingPeriod::LongTerm), -100.0);
    }
}
