use crate::analysis::{ChartProjector, OverlayPositioner, ViewportTrigger, bucketize};
use crate::config::{CHART, PaginationConfig};
use crate::data::HistoricalSource;
use crate::domain::{InsightEvent, MarketKey, RawTick, SeriesPoint};
use crate::models::{
    LogicalRange, MarkerGroup, PaginationController, PaginationCursor, ProjectedMarker,
    SeriesStore, TickEffect,
};

use super::messages::{PageKind, PageOutcome, PageRequest, PageResponse};
use super::streaming::{StreamOutcome, StreamingMerger};

#[cfg(debug_assertions)]
use crate::config::DF;

/// Synchronizes one chart's series, live ticks and insight markers.
///
/// I/O stays outside: the engine hands out `PageRequest`s and is fed back
/// `PageResponse`s and `RawTick`s, all on the caller's thread.
pub struct ChartSync {
    market: MarketKey,
    /// Bumped on every market switch. Responses carrying an older value are dropped.
    generation: u64,

    store: SeriesStore,
    pagination: PaginationController,
    streaming: StreamingMerger,

    insights: Vec<InsightEvent>,
    highlighted: Option<String>,
    groups: Vec<MarkerGroup>,
    overlay: OverlayPositioner,
    /// Bumped whenever series, insights or highlight change the marker groups.
    revision: u64,
}

impl ChartSync {
    pub fn new(market: MarketKey) -> Self {
        Self::with_page_size(market, CHART.pagination.page_size)
    }

    /// Page size capped at what `source` returns per call. A page the source
    /// truncated would otherwise read as short and end pagination early.
    pub fn for_source(market: MarketKey, page_size: usize, source: &dyn HistoricalSource) -> Self {
        let max = source.max_page_size().max(1);
        if page_size > max {
            log::warn!(
                "Page size {} exceeds the {} limit of {} bars; using {}",
                page_size,
                source.name(),
                max,
                max
            );
        }
        Self::with_page_size(market, page_size.min(max))
    }

    pub fn with_page_size(market: MarketKey, page_size: usize) -> Self {
        let config = PaginationConfig {
            page_size,
            edge_lookahead_bars: CHART.pagination.edge_lookahead_bars,
        };
        Self {
            market,
            generation: 0,
            store: SeriesStore::new(),
            pagination: PaginationController::new(&config),
            streaming: StreamingMerger::new(),
            insights: Vec::new(),
            highlighted: None,
            groups: Vec::new(),
            overlay: OverlayPositioner::new(),
            revision: 0,
        }
    }

    pub fn market(&self) -> &MarketKey {
        &self.market
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn series(&self) -> &[SeriesPoint] {
        self.store.points()
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn pagination_status(&self) -> PaginationCursor {
        self.pagination.cursor()
    }

    pub fn historical_data_loaded(&self) -> bool {
        self.streaming.historical_data_loaded()
    }

    pub fn marker_groups(&self) -> &[MarkerGroup] {
        &self.groups
    }

    pub fn insights(&self) -> &[InsightEvent] {
        &self.insights
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }

    /// Drops everything tied to the old market and returns the first request for the new one.
    pub fn switch_market(&mut self, market: MarketKey) -> PageRequest {
        self.generation += 1;

        #[cfg(debug_assertions)]
        if DF.log_engine_core {
            log::info!(
                "🔀 ENGINE: {} -> {} (generation {})",
                self.market,
                market,
                self.generation
            );
        }

        self.market = market;
        self.store.clear();
        self.pagination.reset();
        self.streaming.set_historical_data_loaded(false);
        self.overlay.clear();
        self.regroup();
        self.initial_request()
    }

    pub fn initial_request(&self) -> PageRequest {
        PageRequest {
            generation: self.generation,
            market: self.market.clone(),
            end_time: None,
            limit: self.pagination.page_size(),
            kind: PageKind::Initial,
        }
    }

    /// Visible-range notification from the chart. Returns a request when an older page is due.
    pub fn on_visible_range(&mut self, range: LogicalRange) -> Option<PageRequest> {
        if !self.historical_data_loaded() {
            return None;
        }
        let end_time = self.pagination.begin_fetch(&range)?;
        Some(PageRequest {
            generation: self.generation,
            market: self.market.clone(),
            end_time: Some(end_time),
            limit: self.pagination.page_size(),
            kind: PageKind::Older,
        })
    }

    pub fn on_page(&mut self, response: PageResponse) -> PageOutcome {
        let PageResponse { request, result } = response;

        if request.generation != self.generation || request.market != self.market {
            #[cfg(debug_assertions)]
            if DF.log_engine_core {
                log::info!(
                    "🗑️ ENGINE: dropping {:?} page for {} (generation {} != {})",
                    request.kind,
                    request.market,
                    request.generation,
                    self.generation
                );
            }
            return PageOutcome::Stale;
        }

        match (request.kind, result) {
            (PageKind::Initial, Ok(points)) => {
                self.store.replace(points);
                self.pagination.set_earliest_loaded(self.store.first_time());
                self.streaming.set_historical_data_loaded(true);
                self.regroup();

                #[cfg(debug_assertions)]
                if DF.log_engine_core {
                    log::info!("📈 ENGINE: {} loaded {} points", self.market, self.store.len());
                }
                PageOutcome::Loaded {
                    points: self.store.len(),
                }
            }
            (PageKind::Initial, Err(e)) => {
                log::warn!("Initial load for {} failed: {}", self.market, e);
                PageOutcome::Failed
            }
            (PageKind::Older, Ok(points)) => {
                let returned = points.len();
                let new_points = self.store.merge_prepend(points);
                self.pagination.set_earliest_loaded(self.store.first_time());
                let state = self.pagination.on_page_merged(new_points, returned);
                if new_points > 0 {
                    self.regroup();
                }
                PageOutcome::Merged { new_points, state }
            }
            (PageKind::Older, Err(e)) => {
                self.pagination.on_fetch_failed(&e);
                PageOutcome::Failed
            }
        }
    }

    pub fn on_tick(&mut self, tick: &RawTick) -> StreamOutcome {
        let outcome = self.streaming.apply(&mut self.store, &self.market, tick);
        if let StreamOutcome::Applied(TickEffect::Updated | TickEffect::Appended) = outcome {
            self.regroup();
        }
        outcome
    }

    pub fn set_insights(&mut self, insights: Vec<InsightEvent>) {
        self.insights = insights;
        self.regroup();
    }

    pub fn set_highlighted(&mut self, id: Option<String>) {
        if self.highlighted == id {
            return;
        }
        self.highlighted = id;
        self.regroup();
    }

    /// Fresh projection for the current viewport. Nothing is carried over from earlier calls.
    pub fn project_markers(
        &mut self,
        trigger: ViewportTrigger,
        projector: &dyn ChartProjector,
    ) -> &[ProjectedMarker] {
        self.overlay
            .on_trigger(trigger, &self.groups, projector, &CHART.overlay)
    }

    /// Markers from the most recent `project_markers` call.
    pub fn projected_markers(&self) -> &[ProjectedMarker] {
        self.overlay.markers()
    }

    fn regroup(&mut self) {
        self.groups = bucketize(
            &self.insights,
            self.store.points(),
            self.market.bucket_seconds(),
            self.highlighted.as_deref(),
        );
        self.revision += 1;
    }

    /// Initial page fetched and applied in one step.
    pub async fn load_initial(&mut self, source: &dyn HistoricalSource) -> PageOutcome {
        let response = self.initial_request().execute(source).await;
        self.on_page(response)
    }

    /// Older page for `range`, if one is due.
    pub async fn load_older(
        &mut self,
        range: LogicalRange,
        source: &dyn HistoricalSource,
    ) -> Option<PageOutcome> {
        let request = self.on_visible_range(range)?;
        let response = request.execute(source).await;
        Some(self.on_page(response))
    }
}
