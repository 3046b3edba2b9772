mod core;
mod messages;
mod streaming;

#[cfg(test)]
mod flow_tests;

pub use core::ChartSync;

pub use messages::{PageKind, PageOutcome, PageRequest, PageResponse};
pub use streaming::{StreamOutcome, StreamingMerger, normalize_tick_time};
