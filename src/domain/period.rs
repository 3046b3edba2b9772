use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use crate::utils::TimeUtils;

/// Chart granularities offered by the period selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Default)]
pub enum Period {
    M15,
    H1,
    H4,
    #[default]
    D1,
    W1,
    MN1,
}

impl Period {
    /// Total: anything the selector does not offer resolves to one day.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "15m" => Self::M15,
            "1h" | "1H" => Self::H1,
            "4h" | "4H" => Self::H4,
            "1d" | "1D" => Self::D1,
            "1w" | "1W" => Self::W1,
            "1M" => Self::MN1,
            _ => Self::D1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
            Self::W1 => "1w",
            Self::MN1 => "1M",
        }
    }

    pub fn bucket_seconds(&self) -> i64 {
        match self {
            Self::M15 => TimeUtils::S_IN_15_MIN,
            Self::H1 => TimeUtils::S_IN_H,
            Self::H4 => TimeUtils::S_IN_4_H,
            Self::D1 => TimeUtils::S_IN_D,
            Self::W1 => TimeUtils::S_IN_W,
            Self::MN1 => TimeUtils::S_IN_1_M, // approx
        }
    }

    /// Exchange weeks start on Monday and months on the 1st, so those buckets
    /// do not sit on a fixed grid counted from the epoch.
    pub fn is_fixed_grid(&self) -> bool {
        !matches!(self, Self::W1 | Self::MN1)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Bucket width in seconds for a period label. Unknown labels resolve to one day.
pub fn resolve_bucket_seconds(period: &str) -> i64 {
    Period::from_label(period).bucket_seconds()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn resolves_known_labels() {
        assert_eq!(resolve_bucket_seconds("15m"), 900);
        assert_eq!(resolve_bucket_seconds("1h"), 3_600);
        assert_eq!(resolve_bucket_seconds("4h"), 14_400);
        assert_eq!(resolve_bucket_seconds("1d"), 86_400);
        assert_eq!(resolve_bucket_seconds("1w"), 604_800);
        assert_eq!(resolve_bucket_seconds("1M"), 2_592_000);
    }

    #[test]
    fn unknown_labels_fall_back_to_one_day() {
        assert_eq!(resolve_bucket_seconds("3d"), 86_400);
        assert_eq!(resolve_bucket_seconds(""), 86_400);
        // minutes, not months
        assert_eq!(resolve_bucket_seconds("1m"), 86_400);
    }

    #[test]
    fn labels_round_trip_through_the_selector() {
        for period in Period::iter() {
            assert_eq!(Period::from_label(period.label()), period);
            assert_eq!(period.to_string(), period.label());
        }
    }
}
