use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use futures::StreamExt;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::config::BINANCE;
use crate::domain::{MarketKey, RawTick};
use crate::utils::format_duration;

#[cfg(debug_assertions)]
use crate::config::DF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    Disconnected,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One kline subscription at a time on the Binance combined stream.
/// Switching markets stops the old connection before the new one starts sending.
pub struct LiveFeed {
    status: Arc<Mutex<ConnectionStatus>>,
    // Per-subscription stop signal. Dropping it wakes the connection task.
    stop: Option<watch::Sender<bool>>,
    tick_tx: Sender<RawTick>,
    subscribed: Option<MarketKey>,
}

pub fn build_kline_stream_url(market: &MarketKey) -> String {
    format!(
        "{}{}@kline_{}",
        BINANCE.ws.combined_base_url,
        market.symbol.to_lowercase(),
        market.period.label()
    )
}

impl LiveFeed {
    pub fn new(tick_tx: Sender<RawTick>) -> Self {
        Self {
            status: Arc::new(Mutex::new(ConnectionStatus::Disconnected)),
            stop: None,
            tick_tx,
            subscribed: None,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *lock(&self.status)
    }

    pub fn subscribe(&mut self, market: &MarketKey) {
        self.unsubscribe();

        let (stop_tx, stop) = watch::channel(false);
        self.stop = Some(stop_tx);
        self.subscribed = Some(market.clone());

        let status = self.status.clone();
        let tick_tx = self.tick_tx.clone();
        let url = build_kline_stream_url(market);
        let name = market.to_string();

        thread::spawn(move || {
            let rt = match Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Live feed for {} could not start a runtime: {}", name, e);
                    return;
                }
            };
            rt.block_on(run_kline_stream_with_reconnect(url, status, stop, tick_tx));
        });
    }

    /// Stops the running connection, if any. Ticks already queued may still arrive.
    pub fn unsubscribe(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.send_replace(true);
        }
        if let Some(_market) = self.subscribed.take() {
            #[cfg(debug_assertions)]
            if DF.log_stream {
                log::info!("🔌 Live feed unsubscribed from {}", _market);
            }
        }
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// True once the owning `LiveFeed` unsubscribed or went away.
fn is_stopped(stop: &watch::Receiver<bool>) -> bool {
    *stop.borrow() || stop.has_changed().is_err()
}

async fn run_kline_stream_with_reconnect(
    url: String,
    status: Arc<Mutex<ConnectionStatus>>,
    mut stop: watch::Receiver<bool>,
    tick_tx: Sender<RawTick>,
) {
    let mut reconnect_delay = BINANCE.ws.initial_reconnect_delay_sec;

    while !is_stopped(&stop) {
        *lock(&status) = ConnectionStatus::Connecting;

        #[cfg(debug_assertions)]
        if DF.log_stream {
            log::info!("Attempting connection to {}", url);
        }
        match run_kline_stream(&url, &status, &mut stop, &tick_tx).await {
            Ok(StreamEnd::Stopped) => break,
            Ok(StreamEnd::Closed) => {
                log::warn!("WebSocket closed normally. Reconnecting...");
                reconnect_delay = BINANCE.ws.initial_reconnect_delay_sec;
            }
            Err(e) => {
                log::error!(
                    "WebSocket connection failed: {}. Retrying in {}...",
                    e,
                    format_duration(reconnect_delay as i64 * 1_000)
                );
            }
        }
        *lock(&status) = ConnectionStatus::Disconnected;

        tokio::select! {
            _ = stop.changed() => break,
            _ = sleep(Duration::from_secs(reconnect_delay)) => {}
        }
        reconnect_delay = (reconnect_delay * 2).min(BINANCE.ws.max_reconnect_delay_sec);
    }
    *lock(&status) = ConnectionStatus::Disconnected;
}

enum StreamEnd {
    Closed,
    Stopped,
}

async fn run_kline_stream(
    url: &str,
    status: &Mutex<ConnectionStatus>,
    stop: &mut watch::Receiver<bool>,
    tick_tx: &Sender<RawTick>,
) -> Result<StreamEnd, Box<dyn std::error::Error + Send + Sync>> {
    let ws_stream = tokio::select! {
        _ = stop.changed() => return Ok(StreamEnd::Stopped),
        connected = connect_async(url) => connected?.0,
    };
    *lock(status) = ConnectionStatus::Connected;

    let (_write, mut read) = ws_stream.split();

    loop {
        // A quiet stream must not keep an unsubscribed connection open
        let msg = tokio::select! {
            _ = stop.changed() => return Ok(StreamEnd::Stopped),
            msg = read.next() => msg,
        };
        let Some(msg) = msg else {
            break;
        };
        match msg {
            Ok(Message::Text(text)) => match parse_kline_message(&text) {
                Some(tick) => {
                    #[cfg(debug_assertions)]
                    if DF.log_stream {
                        log::info!(
                            "[kline-tick] {} {} -> {:.6}",
                            tick.symbol,
                            tick.period_label,
                            tick.close
                        );
                    }
                    // Receiver gone means the viewer shut down
                    if tick_tx.send(tick).is_err() {
                        return Ok(StreamEnd::Stopped);
                    }
                }
                None => log::warn!("⚠️ Ignoring unrecognised WebSocket message"),
            },
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => break,
            Err(e) => {
                log::error!("WebSocket error: {}", e);
                return Err(e.into());
            }
            _ => {}
        }
    }

    Ok(StreamEnd::Closed)
}

/// Combined-stream kline payload: `{"stream":..,"data":{"e":"kline","s":..,"k":{..}}}`.
/// A bare (non-combined) kline event is accepted too.
pub fn parse_kline_message(text: &str) -> Option<RawTick> {
    let v: serde_json::Value = serde_json::from_str(text).ok()?;
    let data = v.get("data").unwrap_or(&v);
    if data["e"].as_str()? != "kline" {
        return None;
    }
    let k = data.get("k")?;

    Some(RawTick {
        symbol: data["s"].as_str().or_else(|| k["s"].as_str())?.to_string(),
        period_label: k["i"].as_str()?.to_string(),
        open_time_ms: k["t"].as_i64()?,
        close: k["c"].as_str()?.parse().ok()?,
    })
}
