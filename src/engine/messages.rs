use crate::data::{FetchError, HistoricalSource};
use crate::domain::{MarketKey, SeriesPoint, TimeKey};
use crate::models::PaginationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Most recent page for a freshly selected market. Replaces the store.
    Initial,
    /// Page ending just before the earliest loaded point. Prepended.
    Older,
}

/// One historical fetch, stamped with the generation it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub generation: u64,
    pub market: MarketKey,
    pub end_time: Option<TimeKey>,
    pub limit: usize,
    pub kind: PageKind,
}

impl PageRequest {
    pub async fn execute(self, source: &dyn HistoricalSource) -> PageResponse {
        let result = source
            .fetch(&self.market.symbol, self.market.period, self.end_time, self.limit)
            .await;
        PageResponse {
            request: self,
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageResponse {
    pub request: PageRequest,
    pub result: Result<Vec<SeriesPoint>, FetchError>,
}

/// What applying a `PageResponse` did to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Loaded { points: usize },
    Merged { new_points: usize, state: PaginationState },
    Failed,
    /// Issued before the last market switch. Dropped untouched.
    Stale,
}
