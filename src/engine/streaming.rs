use crate::domain::{MarketKey, Period, RawTick, SeriesPoint, TimeKey};
use crate::models::{SeriesStore, TickEffect};
use crate::utils::TimeUtils;

#[cfg(debug_assertions)]
use crate::config::DF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Applied(TickEffect),
    /// History for the active market has not landed yet.
    NotLoaded,
    OtherMarket,
}

/// Key a live tick lands on.
///
/// A tick inside the last loaded bar's bucket updates that bar, even on calendar
/// periods whose buckets are not epoch aligned. Otherwise fixed-grid periods
/// floor onto their grid and calendar periods keep the exchange's open time.
pub fn normalize_tick_time(tick_time: TimeKey, last: Option<TimeKey>, period: Period) -> TimeKey {
    let bucket = period.bucket_seconds();
    if let Some(last) = last {
        if tick_time >= last && tick_time < last + bucket {
            return last;
        }
    }
    if period.is_fixed_grid() {
        TimeUtils::bucket_start(tick_time, bucket)
    } else {
        tick_time
    }
}

/// Folds live ticks into the tail of the store once history has loaded.
#[derive(Debug, Default)]
pub struct StreamingMerger {
    historical_data_loaded: bool,
}

impl StreamingMerger {
    pub fn new() -> Self {
        Self {
            historical_data_loaded: false,
        }
    }

    pub fn historical_data_loaded(&self) -> bool {
        self.historical_data_loaded
    }

    pub fn set_historical_data_loaded(&mut self, loaded: bool) {
        self.historical_data_loaded = loaded;
    }

    pub fn apply(&self, store: &mut SeriesStore, market: &MarketKey, tick: &RawTick) -> StreamOutcome {
        if !market.matches(&tick.symbol, &tick.period_label) {
            return StreamOutcome::OtherMarket;
        }
        if !self.historical_data_loaded {
            return StreamOutcome::NotLoaded;
        }

        let time = normalize_tick_time(
            TimeUtils::ms_to_time_key(tick.open_time_ms),
            store.last().map(|p| p.time),
            market.period,
        );
        let effect = store.apply_tick(SeriesPoint::new(time, tick.close));

        #[cfg(debug_assertions)]
        if DF.log_stream {
            log::info!("📡 TICK {} @ {} -> {:?} ({:.4})", market, time, effect, tick.close);
        }
        StreamOutcome::Applied(effect)
    }
}
