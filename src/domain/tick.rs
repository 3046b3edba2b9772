use serde::{Deserialize, Serialize};

/// Latest state of the open bar as pushed by a live feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTick {
    pub symbol: String,
    /// Exchange interval code, e.g. `1h` or `1M`.
    pub period_label: String,
    pub open_time_ms: i64,
    pub close: f64,
}
