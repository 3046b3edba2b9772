mod bn_kline;
mod demo;
mod insights;
pub mod price_stream;
mod provider;
mod rate_limiter;

pub use {
    bn_kline::BinanceSource,
    demo::{DemoFeed, DemoSource, demo_insights},
    insights::{load_insights, parse_insights},
    price_stream::{ConnectionStatus, LiveFeed},
    provider::{FetchError, HistoricalSource},
    rate_limiter::GlobalRateLimiter,
};
