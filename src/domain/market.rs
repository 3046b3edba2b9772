use serde::{Deserialize, Serialize};

use crate::domain::Period;

/// Identifies the series the chart is showing: one symbol at one period.
#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq)]
pub struct MarketKey {
    pub symbol: String,
    pub period: Period,
}

impl MarketKey {
    pub fn new(symbol: impl Into<String>, period: Period) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            period,
        }
    }

    pub fn bucket_seconds(&self) -> i64 {
        self.period.bucket_seconds()
    }

    /// Live feeds key their messages by lowercase symbol and raw label.
    pub fn matches(&self, symbol: &str, period_label: &str) -> bool {
        self.symbol.eq_ignore_ascii_case(symbol) && self.period == Period::from_label(period_label)
    }
}

impl std::fmt::Display for MarketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} @ {}", self.symbol, self.period)
    }
}
