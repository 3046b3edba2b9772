use std::{error::Error, fmt, sync::Arc};

use async_trait::async_trait;

use crate::domain::{Period, SeriesPoint, TimeKey};

#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    Network(String),
    RateLimited(String),
    Decode(String),
    Unsupported(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "Network failure: {}", msg),
            FetchError::RateLimited(msg) => write!(f, "Rate limited by upstream: {}", msg),
            FetchError::Decode(msg) => write!(f, "Malformed response: {}", msg),
            FetchError::Unsupported(msg) => write!(f, "Unsupported request: {}", msg),
        }
    }
}

impl Error for FetchError {}

/// Abstract interface for loading historical series points.
#[async_trait]
pub trait HistoricalSource: Send + Sync {
    /// Up to `limit` points ending at `end_time` (inclusive), ascending by time.
    /// `None` means "the most recent page".
    async fn fetch(
        &self,
        symbol: &str,
        period: Period,
        end_time: Option<TimeKey>,
        limit: usize,
    ) -> Result<Vec<SeriesPoint>, FetchError>;

    fn name(&self) -> &'static str;

    /// Most points one call can return. Larger limits are silently truncated.
    fn max_page_size(&self) -> usize {
        usize::MAX
    }
}

#[async_trait]
impl<T: HistoricalSource + ?Sized> HistoricalSource for Arc<T> {
    async fn fetch(
        &self,
        symbol: &str,
        period: Period,
        end_time: Option<TimeKey>,
        limit: usize,
    ) -> Result<Vec<SeriesPoint>, FetchError> {
        (**self).fetch(symbol, period, end_time, limit).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn max_page_size(&self) -> usize {
        (**self).max_page_size()
    }
}
