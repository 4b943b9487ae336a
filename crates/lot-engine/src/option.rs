//! Option contract symbols: `<underlying><YYMMDD><P|C><strike * 1000, 8 digits>`.

use crate::error::LotError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Length of the `<YYMMDD><P|C><8 digits>` suffix.
const SUFFIX_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionRight {
    #[serde(rename = "P")]
    Put,
    #[serde(rename = "C")]
    Call,
}

impl OptionRight {
    /// +1 for calls, -1 for puts.
    pub fn sign(&self) -> f64 {
        match self {
            OptionRight::Call => 1.0,
            OptionRight::Put => -1.0,
        }
    }
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionRight::Put => write!(f, "P"),
            OptionRight::Call => write!(f, "C"),
        }
    }
}

/// A decoded option symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub underlying: String,
    pub expiry: NaiveDate,
    pub right: OptionRight,
    pub strike: f64,
}

impl OptionContract {
    /// Value of exercising now: positive when in the money.
    pub fn intrinsic_value(&self, underlying_quote: f64) -> f64 {
        (underlying_quote - self.strike) * self.right.sign()
    }

    pub fn is_in_the_money(&self, underlying_quote: f64) -> bool {
        self.intrinsic_value(underlying_quote) > 0.0
    }

    /// Option quote minus any positive intrinsic value.
    pub fn time_value(&self, option_quote: f64, underlying_quote: f64) -> f64 {
        let intrinsic = self.intrinsic_value(underlying_quote);
        if intrinsic > 0.0 {
            option_quote - intrinsic
        } else {
            option_quote
        }
    }
}

impl std::str::FromStr for OptionContract {
    type Err = LotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_option_symbol(s).ok_or_else(|| LotError::InvalidSymbol(s.to_string()))
    }
}

/// Decode an option symbol. Returns `None` for anything that is not one,
/// which is how stocks are told apart from options.
pub fn decode_option_symbol(symbol: &str) -> Option<OptionContract> {
    if !symbol.is_ascii() || symbol.len() < SUFFIX_LEN {
        return None;
    }
    let (underlying, suffix) = symbol.split_at(symbol.len() - SUFFIX_LEN);
    let bytes = suffix.as_bytes();
    let date_digits = &suffix[..6];
    let strike_digits = &suffix[7..];
    if !date_digits.bytes().all(|b| b.is_ascii_digit())
        || !strike_digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let right = match bytes[6] {
        b'P' => OptionRight::Put,
        b'C' => OptionRight::Call,
        _ => return None,
    };

    let year: i32 = date_digits[..2].parse().ok()?;
    let month: u32 = date_digits[2..4].parse().ok()?;
    let day: u32 = date_digits[4..].parse().ok()?;
    let expiry = NaiveDate::from_ymd_opt(2000 + year, month, day)?;
    let strike = strike_digits.parse::<u64>().ok()? as f64 / 1000.0;

    let underlying = match underlying {
        "BRKB" => "BRK-B",
        "VIX" => "^VIX",
        other => other,
    };

    Some(OptionContract {
        underlying: underlying.to_string(),
        expiry,
        right,
        strike,
    })
}

pub fn is_option_symbol(symbol: &str) -> bool {
    decode_option_symbol(symbol).is_some()
}

/// Underlying for options, the symbol itself for everything else.
pub fn effective_symbol(symbol: &str) -> String {
    match decode_option_symbol(symbol) {
        Some(contract) => contract.underlying,
        None => symbol.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_call() {
        let c = decode_option_symbol("AAPL230616C00150000").unwrap();
        assert_eq!(c.underlying, "AAPL");
        assert_eq!(c.expiry, NaiveDate::from_ymd_opt(2023, 6, 16).unwrap());
        assert_eq!(c.right, OptionRight::Call);
        assert_eq!(c.strike, 150.0);
    }

    #[test]
    fn test_decode_put_with_fractional_strike() {
        let c = decode_option_symbol("SPY120317P00127500").unwrap();
        assert_eq!(c.right, OptionRight::Put);
        assert_eq!(c.strike, 127.5);
    }

    #[test]
    fn test_not_an_option() {
        assert!(decode_option_symbol("AAPL").is_none());
        assert!(decode_option_symbol("AAPL230616X00150000").is_none());
        assert!(decode_option_symbol("AAPL231316C00150000").is_none());
        assert!(decode_option_symbol("AAPL230616C0015000A").is_none());
        assert!("MSFT".parse::<OptionContract>().is_err());
    }

    #[test]
    fn test_aliases() {
        assert_eq!(decode_option_symbol("BRKB230616C00300000").unwrap().underlying, "BRK-B");
        assert_eq!(decode_option_symbol("VIX230616P00020000").unwrap().underlying, "^VIX");
        assert_eq!(effective_symbol("VIX230616P00020000"), "^VIX");
        assert_eq!(effective_symbol("VIX"), "VIX");
    }

    #[test]
    fn test_in_the_money_and_time_value() {
        let call = decode_option_symbol("AAPL230616C00150000").unwrap();
        assert!(call.is_in_the_money(160.0));
        assert!(!call.is_in_the_money(150.0));
        assert!((call.time_value(12.0, 160.0) - 2.0).abs() < 1e-12);

        let put = decode_option_symbol("AAPL230616P00150000").unwrap();
        assert!(put.is_in_the_money(140.0));
        assert!(!put.is_in_the_money(160.0));
        assert_eq!(put.time_value(1.5, 160.0), 1.5);
    }
}
