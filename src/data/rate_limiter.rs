use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// Request-weight budget shared by every REST call of one process.
/// Resets on the wall-clock minute, matching the exchange's own window.
#[derive(Clone)]
pub struct GlobalRateLimiter {
    inner: Arc<Mutex<WeightWindow>>,
}

#[derive(Debug)]
struct WeightWindow {
    used_weight: u32,
    minute_idx: u64,
    limit: u32,
}

impl WeightWindow {
    /// Spend `cost` in minute `now_idx` if the budget allows it.
    fn try_spend(&mut self, cost: u32, now_idx: u64) -> bool {
        if now_idx > self.minute_idx {
            self.used_weight = 0;
            self.minute_idx = now_idx;
        }
        // A single call heavier than the whole budget would otherwise wait forever
        let cost = cost.min(self.limit);
        if self.used_weight + cost <= self.limit {
            self.used_weight += cost;
            return true;
        }
        false
    }
}

impl GlobalRateLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WeightWindow {
                used_weight: 0,
                minute_idx: current_minute_idx(),
                limit: limit.max(1),
            })),
        }
    }

    /// Waits until `cost` weight is available, then spends it.
    pub async fn acquire(&self, cost: u32, context: &str) {
        loop {
            let (wait, used, limit) = {
                let mut window = self.inner.lock().await;
                if window.try_spend(cost, current_minute_idx()) {
                    return;
                }
                (until_next_minute(), window.used_weight, window.limit)
            };

            log::warn!(
                "🛑 Rate limit saturated for [{}]. Used: {}/{}. Waiting {:.1}s (until :00)...",
                context,
                used,
                limit,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

fn current_minute_idx() -> u64 {
    epoch_secs() / 60
}

fn until_next_minute() -> Duration {
    // 100ms past :00 so the retry lands inside the new window
    Duration::from_secs(60 - epoch_secs() % 60) + Duration::from_millis(100)
}
