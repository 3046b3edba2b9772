use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::TimeKey;

pub type AppInstant = web_time::Instant;

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const S_IN_MIN: i64 = 60;
    pub const S_IN_15_MIN: i64 = Self::S_IN_MIN * 15;
    pub const S_IN_H: i64 = Self::S_IN_MIN * 60;
    pub const S_IN_4_H: i64 = Self::S_IN_H * 4;
    pub const S_IN_D: i64 = Self::S_IN_H * 24;
    pub const S_IN_W: i64 = Self::S_IN_D * 7;
    pub const S_IN_1_M: i64 = Self::S_IN_D * 30;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d";
    pub const CROSSHAIR_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

    /// Convert a bucket width in seconds to a Binance-style shorthand (e.g. `15m`, `1h`).
    pub fn interval_to_string(interval_s: i64) -> &'static str {
        match interval_s {
            Self::S_IN_MIN => "1m",
            Self::S_IN_15_MIN => "15m",
            Self::S_IN_H => "1h",
            Self::S_IN_4_H => "4h",
            Self::S_IN_D => "1d",
            Self::S_IN_W => "1w",
            Self::S_IN_1_M => "1M",
            _ => "unknown",
        }
    }

    /// Start of the fixed-width bucket containing `time`.
    #[inline]
    pub fn bucket_start(time: TimeKey, bucket_seconds: i64) -> TimeKey {
        if bucket_seconds <= 0 {
            return time;
        }
        time.div_euclid(bucket_seconds) * bucket_seconds
    }

    pub fn ms_to_time_key(epoch_ms: i64) -> TimeKey {
        epoch_ms.div_euclid(Self::MS_IN_S)
    }

    pub fn time_key_to_ms(time: TimeKey) -> i64 {
        time * Self::MS_IN_S
    }

    /// Normalize a textual time into seconds since epoch.
    /// Accepts RFC 3339, `YYYY-MM-DD` (midnight UTC) and integer epochs (seconds or milliseconds).
    pub fn parse_time_key(text: &str) -> Option<TimeKey> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&Utc).timestamp());
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, Self::STANDARD_TIME_FORMAT) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc().timestamp());
        }
        let raw = text.parse::<i64>().ok()?;
        // 1e11 seconds is year 5138, so anything above it is a millisecond epoch
        if raw.abs() >= 100_000_000_000 {
            Some(Self::ms_to_time_key(raw))
        } else {
            Some(raw)
        }
    }

    pub fn epoch_sec_to_date_string(epoch_sec: TimeKey) -> String {
        Self::epoch_sec_to_string(epoch_sec, Self::STANDARD_TIME_FORMAT)
    }

    pub fn epoch_sec_to_string(epoch_sec: TimeKey, format: &str) -> String {
        match DateTime::from_timestamp(epoch_sec, 0) {
            Some(dt) => dt.format(format).to_string(),
            None => String::new(),
        }
    }
}

pub fn now_time_key() -> TimeKey {
    Utc::now().timestamp()
}

pub fn format_duration(ms: i64) -> String {
    let secs = ms / 1000;
    if secs < 60 {
        return format!("{}s", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }
    let days = hours / 24;
    format!("{}d", days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_start_floors_onto_grid() {
        assert_eq!(TimeUtils::bucket_start(150, 100), 100);
        assert_eq!(TimeUtils::bucket_start(200, 100), 200);
        assert_eq!(TimeUtils::bucket_start(-1, 100), -100);
        assert_eq!(TimeUtils::bucket_start(42, 0), 42);
    }

    #[test]
    fn parses_dates_rfc3339_and_epochs() {
        assert_eq!(TimeUtils::parse_time_key("2024-01-02"), Some(1_704_153_600));
        assert_eq!(
            TimeUtils::parse_time_key("2024-01-02T00:00:30Z"),
            Some(1_704_153_630)
        );
        assert_eq!(TimeUtils::parse_time_key("1704153600"), Some(1_704_153_600));
        assert_eq!(
            TimeUtils::parse_time_key("1704153600123"),
            Some(1_704_153_600)
        );
        assert_eq!(TimeUtils::parse_time_key("yesterday"), None);
    }

    #[test]
    fn interval_labels_match_exchange_codes() {
        assert_eq!(TimeUtils::interval_to_string(900), "15m");
        assert_eq!(TimeUtils::interval_to_string(TimeUtils::S_IN_1_M), "1M");
        assert_eq!(TimeUtils::interval_to_string(7), "unknown");
    }

    #[test]
    fn durations_are_compact() {
        assert_eq!(format_duration(5_000), "5s");
        assert_eq!(format_duration(3 * 3_600_000), "3h");
        assert_eq!(format_duration(2 * 86_400_000), "2d");
    }
}
