use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::demo::{HISTORY_DEPTH, SEED, START_PRICE, TICK_INTERVAL_MS};
use crate::data::{FetchError, HistoricalSource};
use crate::domain::{InsightEvent, MarketKey, Period, RawTick, SeriesPoint, TimeKey, TradeDirection};
use crate::utils::{TimeUtils, now_time_key};

#[cfg(debug_assertions)]
use crate::config::DF;

/// SplitMix64 step. Deterministic, so the same bar index always gives the same price.
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn unit_noise(seed: u64, n: u64) -> f64 {
    // [-1, 1)
    (mix(seed ^ n) >> 11) as f64 / (1u64 << 52) as f64 - 1.0
}

fn symbol_seed(symbol: &str) -> u64 {
    symbol
        .bytes()
        .fold(SEED, |acc, b| mix(acc ^ u64::from(b)))
}

/// Synthetic price of bar `index` (0 = oldest) for a symbol.
pub fn synthetic_price(symbol: &str, index: usize) -> f64 {
    let seed = symbol_seed(symbol);
    let i = index as f64;
    let scale = 0.5 + (seed % 1_000) as f64 / 1_000.0;
    let trend = 0.18 * (i / 211.0).sin() + 0.07 * (i / 37.0).sin();
    let noise = 0.012 * unit_noise(seed, index as u64);
    START_PRICE * scale * (1.0 + trend + noise)
}

/// Offline history with a fixed depth, so paging backwards eventually runs dry.
#[derive(Debug, Clone)]
pub struct DemoSource {
    now: TimeKey,
    depth: usize,
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoSource {
    pub fn new() -> Self {
        Self::anchored(now_time_key(), HISTORY_DEPTH)
    }

    pub fn anchored(now: TimeKey, depth: usize) -> Self {
        Self { now, depth }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Open time of the newest bar.
    pub fn newest_time(&self, period: Period) -> TimeKey {
        TimeUtils::bucket_start(self.now, period.bucket_seconds())
    }

    pub fn bar_time(&self, period: Period, index: usize) -> TimeKey {
        let back = (self.depth.saturating_sub(1) - index.min(self.depth.saturating_sub(1))) as i64;
        self.newest_time(period) - back * period.bucket_seconds()
    }

    /// Largest bar index whose open time is <= `end_time`.
    fn last_index_until(&self, period: Period, end_time: Option<TimeKey>) -> Option<usize> {
        if self.depth == 0 {
            return None;
        }
        let newest = self.depth - 1;
        let Some(end) = end_time else {
            return Some(newest);
        };
        let behind = self.newest_time(period) - end;
        if behind <= 0 {
            return Some(newest);
        }
        let bucket = period.bucket_seconds();
        let bars_back = (behind + bucket - 1) / bucket;
        usize::try_from(bars_back)
            .ok()
            .and_then(|back| newest.checked_sub(back))
    }
}

#[async_trait]
impl HistoricalSource for DemoSource {
    async fn fetch(
        &self,
        symbol: &str,
        period: Period,
        end_time: Option<TimeKey>,
        limit: usize,
    ) -> Result<Vec<SeriesPoint>, FetchError> {
        let Some(last) = self.last_index_until(period, end_time) else {
            return Ok(Vec::new());
        };
        let first = (last + 1).saturating_sub(limit);
        let points: Vec<SeriesPoint> = (first..=last)
            .map(|i| SeriesPoint::new(self.bar_time(period, i), synthetic_price(symbol, i)))
            .collect();

        #[cfg(debug_assertions)]
        if DF.log_demo {
            log::info!(
                "🧪 DEMO: {} {} bars {}..={} ({} points)",
                symbol,
                period,
                first,
                last,
                points.len()
            );
        }
        Ok(points)
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}

/// Insights scattered over the newest `span` bars, some deliberately sharing a bar.
pub fn demo_insights(source: &DemoSource, market: &MarketKey, count: usize) -> Vec<InsightEvent> {
    let bucket = market.bucket_seconds();
    let newest = source.newest_time(market.period);
    let seed = symbol_seed(&market.symbol);
    let span = source.depth().clamp(1, 400) as u64;

    (0..count)
        .map(|n| {
            let r = mix(seed ^ (n as u64).wrapping_mul(0xA24B_AED4_963E_E407));
            let bars_back = (r % span) as i64;
            let offset = ((r >> 32) % bucket as u64) as i64;
            let direction = if r & 1 == 0 {
                TradeDirection::Long
            } else {
                TradeDirection::Short
            };
            let mut event = InsightEvent::new(format!("demo-{}", n), newest - bars_back * bucket + offset)
                .with_direction(direction);
            event.alert_options.label = Some(format!("{} signal #{}", direction_label(direction), n));
            event
        })
        .collect()
}

fn direction_label(direction: TradeDirection) -> &'static str {
    match direction {
        TradeDirection::Long => "Long",
        TradeDirection::Short => "Short",
    }
}

/// Synthetic kline ticks for the newest bar of one market.
pub struct DemoFeed {
    stop: Arc<Mutex<bool>>,
}

impl DemoFeed {
    pub fn start(source: &DemoSource, market: &MarketKey, tick_tx: Sender<RawTick>) -> Self {
        let stop = Arc::new(Mutex::new(false));
        let stop_flag = stop.clone();
        let market = market.clone();
        let base = synthetic_price(&market.symbol, source.depth().saturating_sub(1));

        thread::spawn(move || {
            let seed = symbol_seed(&market.symbol) ^ 0xF00D;
            let mut price = base;
            let mut n = 0u64;
            loop {
                thread::sleep(Duration::from_millis(TICK_INTERVAL_MS));
                if *stop_flag.lock().unwrap_or_else(|p| p.into_inner()) {
                    break;
                }
                n += 1;
                price *= 1.0 + 0.001 * unit_noise(seed, n);
                let open_time = TimeUtils::bucket_start(now_time_key(), market.bucket_seconds());
                let tick = RawTick {
                    symbol: market.symbol.clone(),
                    period_label: market.period.label().to_string(),
                    open_time_ms: TimeUtils::time_key_to_ms(open_time),
                    close: price,
                };
                if tick_tx.send(tick).is_err() {
                    break;
                }
            }
        });

        Self { stop }
    }

    pub fn stop(&self) {
        *self.stop.lock().unwrap_or_else(|p| p.into_inner()) = true;
    }
}

impl Drop for DemoFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: TimeKey = 1_700_000_000;

    #[tokio::test]
    async fn latest_page_ends_at_the_current_bucket() {
        let source = DemoSource::anchored(NOW, 1_000);
        let page = source.fetch("BTCUSDT", Period::D1, None, 500).await.unwrap();
        assert_eq!(page.len(), 500);
        assert_eq!(page.last().unwrap().time, TimeUtils::bucket_start(NOW, 86_400));
        assert!(page.windows(2).all(|w| w[1].time - w[0].time == 86_400));
    }

    #[tokio::test]
    async fn end_time_is_inclusive_and_pages_chain_without_overlap() {
        let source = DemoSource::anchored(NOW, 1_000);
        let newest = source.fetch("BTCUSDT", Period::H1, None, 10).await.unwrap();
        let older = source
            .fetch("BTCUSDT", Period::H1, Some(newest[0].time - 1), 10)
            .await
            .unwrap();
        assert_eq!(older.len(), 10);
        assert_eq!(older.last().unwrap().time, newest[0].time - 3_600);

        let same = source
            .fetch("BTCUSDT", Period::H1, Some(newest[0].time), 1)
            .await
            .unwrap();
        assert_eq!(same, vec![newest[0]]);
    }

    #[tokio::test]
    async fn history_runs_dry_at_depth() {
        let source = DemoSource::anchored(NOW, 12);
        let page = source.fetch("ETHUSDT", Period::H4, None, 10).await.unwrap();
        let rest = source
            .fetch("ETHUSDT", Period::H4, Some(page[0].time - 1), 10)
            .await
            .unwrap();
        assert_eq!(rest.len(), 2);
        let nothing = source
            .fetch("ETHUSDT", Period::H4, Some(rest[0].time - 1), 10)
            .await
            .unwrap();
        assert!(nothing.is_empty());
    }

    #[test]
    fn prices_are_deterministic_and_positive() {
        for i in [0, 1, 500, 1_799] {
            let p = synthetic_price("BTCUSDT", i);
            assert_eq!(p, synthetic_price("BTCUSDT", i));
            assert!(p > 0.0);
        }
        assert_ne!(synthetic_price("BTCUSDT", 7), synthetic_price("SOLUSDT", 7));
    }

    #[test]
    fn demo_insights_have_unique_ids_inside_loaded_history() {
        let source = DemoSource::anchored(NOW, 1_000);
        let market = MarketKey::new("BTCUSDT", Period::D1);
        let events = demo_insights(&source, &market, 40);
        assert_eq!(events.len(), 40);
        let oldest = source.bar_time(Period::D1, 0);
        let newest_end = source.newest_time(Period::D1) + 86_400;
        assert!(events.iter().all(|e| e.created_at >= oldest && e.created_at < newest_end));
        assert!(events.iter().all(|e| e.direction().is_some()));
    }
}
