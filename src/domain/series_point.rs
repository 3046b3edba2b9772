use serde::{Deserialize, Serialize};

/// Bucket-aligned timestamp, seconds since epoch.
pub type TimeKey = i64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: TimeKey,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(time: TimeKey, value: f64) -> Self {
        Self { time, value }
    }
}
