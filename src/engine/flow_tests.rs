//! End-to-end engine flows against in-memory and demo sources.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::data::{DemoSource, FetchError, HistoricalSource};
use crate::domain::{InsightEvent, MarketKey, Period, RawTick, SeriesPoint, TimeKey};
use crate::engine::{ChartSync, PageOutcome, PageResponse, StreamOutcome};
use crate::models::{LogicalRange, PaginationState, TickEffect};

const M15: i64 = 900;
const NOW: TimeKey = 1_700_000_000;

/// Fixed ascending history. Optionally fails the next call.
struct VecSource {
    points: Vec<SeriesPoint>,
    calls: AtomicUsize,
    fail_next: AtomicBool,
    last_end_time: Mutex<Option<TimeKey>>,
}

impl VecSource {
    fn with_bars(count: i64) -> Self {
        Self {
            points: (1..=count)
                .map(|i| SeriesPoint::new(i * M15, 100.0 + i as f64))
                .collect(),
            calls: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
            last_end_time: Mutex::new(None),
        }
    }
}

#[async_trait]
impl HistoricalSource for VecSource {
    async fn fetch(
        &self,
        _symbol: &str,
        _period: Period,
        end_time: Option<TimeKey>,
        limit: usize,
    ) -> Result<Vec<SeriesPoint>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_end_time.lock().unwrap() = end_time;
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(FetchError::Network("connection reset".into()));
        }
        let eligible: Vec<SeriesPoint> = self
            .points
            .iter()
            .filter(|p| end_time.is_none_or(|end| p.time <= end))
            .copied()
            .collect();
        let start = eligible.len().saturating_sub(limit);
        Ok(eligible[start..].to_vec())
    }

    fn name(&self) -> &'static str {
        "vec"
    }
}

/// Truncates every call to `max` points, like the exchange does.
struct CappedSource {
    inner: VecSource,
    max: usize,
}

#[async_trait]
impl HistoricalSource for CappedSource {
    async fn fetch(
        &self,
        symbol: &str,
        period: Period,
        end_time: Option<TimeKey>,
        limit: usize,
    ) -> Result<Vec<SeriesPoint>, FetchError> {
        self.inner
            .fetch(symbol, period, end_time, limit.min(self.max))
            .await
    }

    fn name(&self) -> &'static str {
        "capped"
    }

    fn max_page_size(&self) -> usize {
        self.max
    }
}

fn btc_m15() -> MarketKey {
    MarketKey::new("BTCUSDT", Period::M15)
}

fn at_left_edge() -> LogicalRange {
    LogicalRange::new(2.0, 120.0)
}

#[tokio::test]
async fn short_older_page_marks_the_start_of_history() {
    let source = VecSource::with_bars(503);
    let mut chart = ChartSync::with_page_size(btc_m15(), 500);

    assert_eq!(chart.load_initial(&source).await, PageOutcome::Loaded { points: 500 });
    assert_eq!(chart.series()[0].time, 4 * M15);

    let outcome = chart.load_older(at_left_edge(), &source).await;
    assert_eq!(
        outcome,
        Some(PageOutcome::Merged {
            new_points: 3,
            state: PaginationState::BoundaryReached
        })
    );
    assert_eq!(*source.last_end_time.lock().unwrap(), Some(4 * M15 - 1));
    assert_eq!(chart.series().len(), 503);
    assert!(chart.pagination_status().reached_boundary);

    // terminal until the market changes
    assert_eq!(chart.load_older(at_left_edge(), &source).await, None);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn oversized_page_size_is_capped_at_the_source_limit() {
    let source = CappedSource {
        inner: VecSource::with_bars(10_000),
        max: 1_000,
    };
    let mut chart = ChartSync::for_source(btc_m15(), 1_500, &source);

    assert_eq!(chart.load_initial(&source).await, PageOutcome::Loaded { points: 1_000 });
    assert_eq!(
        chart.load_older(at_left_edge(), &source).await,
        Some(PageOutcome::Merged {
            new_points: 1_000,
            state: PaginationState::Idle
        })
    );
    assert!(!chart.pagination_status().reached_boundary);
    assert_eq!(chart.series().len(), 2_000);
}

#[tokio::test]
async fn page_size_under_the_source_limit_is_kept() {
    let source = CappedSource {
        inner: VecSource::with_bars(1_200),
        max: 1_000,
    };
    let mut chart = ChartSync::for_source(btc_m15(), 500, &source);
    assert_eq!(chart.load_initial(&source).await, PageOutcome::Loaded { points: 500 });
}

#[tokio::test]
async fn far_from_the_edge_nothing_is_requested() {
    let source = VecSource::with_bars(2_000);
    let mut chart = ChartSync::with_page_size(btc_m15(), 500);
    chart.load_initial(&source).await;

    assert_eq!(chart.load_older(LogicalRange::new(10.0, 130.0), &source).await, None);
    assert_eq!(chart.load_older(LogicalRange::new(380.0, 500.0), &source).await, None);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_older_page_is_retried_on_the_next_edge_trigger() {
    let source = VecSource::with_bars(1_200);
    let mut chart = ChartSync::with_page_size(btc_m15(), 500);
    chart.load_initial(&source).await;
    let earliest = chart.pagination_status().earliest_loaded_time;

    source.fail_next.store(true, Ordering::SeqCst);
    assert_eq!(
        chart.load_older(at_left_edge(), &source).await,
        Some(PageOutcome::Failed)
    );
    let cursor = chart.pagination_status();
    assert!(!cursor.in_flight);
    assert!(!cursor.reached_boundary);
    assert_eq!(cursor.earliest_loaded_time, earliest);
    assert_eq!(chart.series().len(), 500);

    assert_eq!(
        chart.load_older(at_left_edge(), &source).await,
        Some(PageOutcome::Merged {
            new_points: 500,
            state: PaginationState::Idle
        })
    );
    assert_eq!(chart.series().len(), 1_000);
}

#[tokio::test]
async fn only_one_older_page_is_in_flight() {
    let source = VecSource::with_bars(1_200);
    let mut chart = ChartSync::with_page_size(btc_m15(), 500);
    chart.load_initial(&source).await;

    let first = chart.on_visible_range(at_left_edge());
    assert!(first.is_some());
    assert!(chart.on_visible_range(at_left_edge()).is_none());
    assert!(chart.on_visible_range(LogicalRange::new(0.0, 50.0)).is_none());
}

#[tokio::test]
async fn responses_for_a_previous_market_are_dropped() {
    let source = VecSource::with_bars(600);
    let mut chart = ChartSync::with_page_size(btc_m15(), 500);

    let btc_request = chart.initial_request();
    let eth_request = chart.switch_market(MarketKey::new("ETHUSDT", Period::M15));

    let late_btc: PageResponse = btc_request.execute(&source).await;
    assert_eq!(chart.on_page(late_btc), PageOutcome::Stale);
    assert!(chart.series().is_empty());
    assert!(!chart.historical_data_loaded());

    let eth = eth_request.execute(&source).await;
    assert_eq!(chart.on_page(eth), PageOutcome::Loaded { points: 500 });
    assert_eq!(chart.market().symbol, "ETHUSDT");
}

#[tokio::test]
async fn demo_history_pages_back_to_its_depth() {
    let source = DemoSource::anchored(NOW, 1_200);
    let market = MarketKey::new("SOLUSDT", Period::H1);
    let mut chart = ChartSync::with_page_size(market, 500);

    assert_eq!(chart.load_initial(&source).await, PageOutcome::Loaded { points: 500 });

    let mut states = Vec::new();
    while let Some(outcome) = chart.load_older(at_left_edge(), &source).await {
        if let PageOutcome::Merged { state, .. } = outcome {
            states.push(state);
        }
    }
    assert_eq!(
        states,
        vec![PaginationState::Idle, PaginationState::BoundaryReached]
    );
    assert_eq!(chart.series().len(), 1_200);
    assert!(chart.series().windows(2).all(|w| w[1].time - w[0].time == 3_600));
    assert_eq!(
        chart.pagination_status().earliest_loaded_time,
        Some(source.bar_time(Period::H1, 0))
    );
}

#[tokio::test]
async fn live_ticks_wait_for_history_then_extend_the_series() {
    let source = DemoSource::anchored(NOW, 50);
    let market = MarketKey::new("BTCUSDT", Period::H1);
    let newest = source.newest_time(Period::H1);
    let mut chart = ChartSync::new(market);

    let tick = |open_time: TimeKey, close: f64| RawTick {
        symbol: "BTCUSDT".into(),
        period_label: "1h".into(),
        open_time_ms: open_time * 1_000,
        close,
    };

    assert_eq!(chart.on_tick(&tick(newest, 1.0)), StreamOutcome::NotLoaded);
    chart.load_initial(&source).await;
    assert_eq!(chart.series().len(), 50);

    assert_eq!(
        chart.on_tick(&tick(newest, 123.0)),
        StreamOutcome::Applied(TickEffect::Updated)
    );
    assert_eq!(chart.series().last().map(|p| p.value), Some(123.0));

    assert_eq!(
        chart.on_tick(&tick(newest + 3_600, 124.0)),
        StreamOutcome::Applied(TickEffect::Appended)
    );
    assert_eq!(chart.series().len(), 51);
    assert_eq!(
        chart.on_tick(&tick(newest - 3_600, 1.0)),
        StreamOutcome::Applied(TickEffect::Stale)
    );
    assert_eq!(chart.series().len(), 51);
}

#[tokio::test]
async fn older_page_pulls_an_early_insight_onto_its_own_bar() {
    let source = VecSource::with_bars(1_000);
    let mut chart = ChartSync::with_page_size(btc_m15(), 500);
    chart.load_initial(&source).await;

    let early = 100 * M15 + 30;
    chart.set_insights(vec![InsightEvent::new("early", early)]);
    // before the loaded range it rides on the oldest bar
    assert_eq!(chart.marker_groups()[0].bucket_time, 501 * M15);

    chart.load_older(at_left_edge(), &source).await;
    assert_eq!(chart.marker_groups()[0].bucket_time, 100 * M15);
    assert_eq!(chart.marker_groups()[0].len(), 1);
}
