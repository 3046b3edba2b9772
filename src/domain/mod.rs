// Domain types and value objects
mod insight;
mod market;
mod period;
mod series_point;
mod tick;

pub use insight::{AlertOptions, InsightEvent, TradeDirection};
pub use market::MarketKey;
pub use period::{Period, resolve_bucket_seconds};
pub use series_point::{SeriesPoint, TimeKey};
pub use tick::RawTick;
