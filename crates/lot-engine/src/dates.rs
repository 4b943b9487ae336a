//! Calendar helpers.
//!
//! All day counts are whole calendar days between `NaiveDate`s, so there is
//! no time-of-day or daylight-saving component.

use crate::error::{LotError, LotResult};
use chrono::{Duration, NaiveDate};

/// Days a long position must be held to qualify as long-term.
pub const LONG_TERM_DAYS: i64 = 365;

/// Calendar days from `start` to `end` (negative if `end` is earlier).
pub fn day_offset(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// The date `days` calendar days after `date`, clamped to the representable
/// date range.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Long-term treatment requires a long position held at least a year.
/// Short positions never qualify.
pub fn is_long_term(nshares: f64, start: NaiveDate, end: NaiveDate) -> bool {
    nshares > 0.0 && day_offset(start, end) >= LONG_TERM_DAYS
}

/// Expand legacy two-digit years: `98-03-01` -> `1998-03-01`,
/// `12-03-01` -> `2012-03-01`. Four-digit years pass through untouched.
pub fn normalize_date(date: &str) -> LotResult<String> {
    let mut parts = date.splitn(3, '-');
    let (year, month, day) = match (parts.next(), parts.next(), parts.next()) {
        (Some(y), Some(m), Some(d)) => (y, m, d),
        _ => return Err(LotError::InvalidDate(date.to_string())),
    };
    let mut y: i32 = year
        .trim()
        .parse()
        .map_err(|_| LotError::InvalidDate(date.to_string()))?;
    if y >= 1900 {
        return Ok(date.to_string());
    }
    y += 1900;
    if y < 1970 {
        y += 100;
    }
    Ok(format!("{}-{}-{}", y, month, day))
}

/// Parse an ISO date, accepting legacy two-digit years.
pub fn parse_date(date: &str) -> LotResult<NaiveDate> {
    let normalized = normalize_date(date)?;
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .map_err(|_| LotError::InvalidDate(date.to_string()))
}

/// December 31 of `year`; the financial year is the calendar year.
pub fn year_end(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Valuation date of a report: the end of `year` when one is requested,
/// otherwise `date`, otherwise `today`.
pub fn valuation_date(year: Option<i32>, date: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    match (year, date) {
        (Some(y), _) => year_end(y),
        (None, Some(d)) => d,
        (None, None) => today,
    }
}

/// Date for a day number counted from 1970-01-01.
pub fn from_epoch_days(days: i64) -> NaiveDate {
    add_days(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default(), days)
}

/// `1.2y` for a year or more (365.25-day years), `42d` otherwise.
pub fn format_duration(days: f64) -> String {
    if days >= LONG_TERM_DAYS as f64 {
        format!("{:.1}y", days / 365.25)
    } else {
        format!("{:.0}d", days)
    }
}

/// Serde adapter for `NaiveDate` fields that may carry legacy two-digit years.
pub mod serde_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).map_err(serde::de::Error::custom)
    }
}

/// Same as [`serde_date`] for optional fields; `null` and `""` map to `None`.
pub mod serde_opt_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_some(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if !raw.is_empty() => super::parse_date(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}
