//! Configuration module for the chart sync engine.

// Can all be private now because we have a public re-export.
mod binance;
mod constants;
mod debug;

// Can't be private because we don't re-export it
pub mod plot;

// Re-export commonly used items
pub use binance::{BINANCE, BinanceApiConfig};
pub use constants::{CHART, ChartConfig, OverlayConfig, PaginationConfig, demo};
pub use debug::DF;

/// Activate trace_time macro (scope-level timing of hot paths)
pub const LOG_PERFORMANCE: bool = cfg!(debug_assertions);
