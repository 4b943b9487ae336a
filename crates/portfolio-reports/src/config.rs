use crate::error::ReportError;
use serde::{Deserialize, Serialize};

/// First year the annual report shows.
pub const DEFAULT_FIRST_ANNUAL_YEAR: i32 = 1997;

/// Trailing horizons, in years, of the annual report.
pub const DEFAULT_HORIZONS: [u32; 4] = [1, 3, 5, 10];

/// Index the annual report compares each account against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BenchmarkIndex {
    #[default]
    #[serde(rename = "SPY")]
    Spy,
    #[serde(rename = "QQQ")]
    Qqq,
}

impl BenchmarkIndex {
    pub fn symbol(&self) -> &'static str {
        match self {
            BenchmarkIndex::Spy => "SPY",
            BenchmarkIndex::Qqq => "QQQ",
        }
    }

    /// Ticker the index traded under before a rename, if any.
    pub fn legacy_symbol(&self) -> Option<&'static str> {
        match self {
            BenchmarkIndex::Spy => None,
            BenchmarkIndex::Qqq => Some("QQQQ"),
        }
    }
}

impl std::fmt::Display for BenchmarkIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl std::str::FromStr for BenchmarkIndex {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SPY" => Ok(BenchmarkIndex::Spy),
            "QQQ" | "QQQQ" => Ok(BenchmarkIndex::Qqq),
            other => Err(ReportError::UnknownBenchmark(other.to_string())),
        }
    }
}

/// Parse a comma separated list of positive year counts.
pub fn parse_horizons(raw: &str) -> Result<Vec<u32>, ReportError> {
    let horizons = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().ok().filter(|h| *h > 0))
        .collect::<Option<Vec<u32>>>()
        .ok_or_else(|| ReportError::InvalidHorizons(raw.to_string()))?;
    if horizons.is_empty() {
        return Err(ReportError::InvalidHorizons(raw.to_string()));
    }
    Ok(horizons)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub benchmark: BenchmarkIndex,
    pub first_annual_year: i32,
    pub horizons: Vec<u32>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            benchmark: BenchmarkIndex::default(),
            first_annual_year: DEFAULT_FIRST_ANNUAL_YEAR,
            horizons: DEFAULT_HORIZONS.to_vec(),
        }
    }
}

impl ReportConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or empty keys keep their defaults;
    /// invalid values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        if let Some(raw) = get("PORTFOLIO_BENCHMARK") {
            match raw.parse() {
                Ok(benchmark) => config.benchmark = benchmark,
                Err(e) => tracing::warn!("Ignoring PORTFOLIO_BENCHMARK: {}", e),
            }
        }

        if let Some(raw) = get("PORTFOLIO_FIRST_YEAR") {
            match raw.trim().parse() {
                Ok(year) => config.first_annual_year = year,
                Err(_) => tracing::warn!("Ignoring PORTFOLIO_FIRST_YEAR: not a year: {}", raw),
            }
        }

        if let Some(raw) = get("PORTFOLIO_HORIZONS") {
            match parse_horizons(&raw) {
                Ok(horizons) => config.horizons = horizons,
                Err(e) => tracing::warn!("Ignoring PORTFOLIO_HORIZONS: {}", e),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ReportConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ReportConfig::default());
        assert_eq!(config.benchmark, BenchmarkIndex::Spy);
        assert_eq!(config.horizons, vec![1, 3, 5, 10]);
        assert_eq!(config.first_annual_year, 1997);
    }

    #[test]
    fn test_overrides() {
        let config = ReportConfig::from_lookup(lookup(&[
            ("PORTFOLIO_BENCHMARK", "qqq"),
            ("PORTFOLIO_FIRST_YEAR", "2005"),
            ("PORTFOLIO_HORIZONS", "1, 2"),
        ]));
        assert_eq!(config.benchmark, BenchmarkIndex::Qqq);
        assert_eq!(config.first_annual_year, 2005);
        assert_eq!(config.horizons, vec![1, 2]);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ReportConfig::from_lookup(lookup(&[
            ("PORTFOLIO_BENCHMARK", "DIA"),
            ("PORTFOLIO_FIRST_YEAR", "soon"),
            ("PORTFOLIO_HORIZONS", "1,x"),
        ]));
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn test_parse_horizons() {
        assert_eq!(parse_horizons("3").unwrap(), vec![3]);
        assert!(parse_horizons("0").is_err());
        assert!(parse_horizons(" , ").is_err());
        assert!(matches!(
            "DIA".parse::<BenchmarkIndex>(),
            Err(ReportError::UnknownBenchmark(_))
        ));
        assert_eq!(BenchmarkIndex::Qqq.legacy_symbol(), Some("QQQQ"));
    }
}
