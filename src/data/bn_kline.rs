use {
    async_trait::async_trait,
    binance_sdk::{
        config::ConfigurationRestApi,
        errors::{self, ConnectorError as connection_error},
        spot::{
            SpotRestApi,
            rest_api::{KlinesIntervalEnum, KlinesItemInner, KlinesParams, RestApi},
        },
    },
};

use crate::{
    config::{BINANCE, BinanceApiConfig},
    data::{FetchError, GlobalRateLimiter, HistoricalSource},
    domain::{Period, SeriesPoint, TimeKey},
    utils::TimeUtils,
};

#[cfg(debug_assertions)]
use crate::config::DF;

pub fn interval_for(period: Period) -> KlinesIntervalEnum {
    match period {
        Period::M15 => KlinesIntervalEnum::Interval15m,
        Period::H1 => KlinesIntervalEnum::Interval1h,
        Period::H4 => KlinesIntervalEnum::Interval4h,
        Period::D1 => KlinesIntervalEnum::Interval1d,
        Period::W1 => KlinesIntervalEnum::Interval1w,
        Period::MN1 => KlinesIntervalEnum::Interval1M,
    }
}

/// Historical close prices from the Binance spot klines endpoint.
pub struct BinanceSource {
    client: RestApi,
    limiter: GlobalRateLimiter,
}

impl BinanceSource {
    pub fn new(limiter: GlobalRateLimiter) -> anyhow::Result<Self> {
        Ok(Self {
            client: configure_binance_client()?,
            limiter,
        })
    }
}

fn configure_binance_client() -> anyhow::Result<RestApi> {
    let config = BinanceApiConfig::default();
    let rest_conf = ConfigurationRestApi::builder()
        .timeout(config.timeout_ms)
        .retries(config.retries)
        .backoff(config.backoff_ms)
        .build()?;
    Ok(SpotRestApi::production(rest_conf))
}

/// Open time (ms) and close price of one kline row. Rows are
/// `[open_time, open, high, low, close, volume, close_time, ..]`.
pub fn kline_to_point(row: Vec<KlinesItemInner>) -> Result<SeriesPoint, FetchError> {
    let mut items = row.into_iter();
    let open_time_ms = match items.next() {
        Some(KlinesItemInner::Integer(ms)) => ms,
        Some(_) => return Err(FetchError::Decode("open_time is not an integer".into())),
        None => return Err(FetchError::Decode("empty kline row".into())),
    };
    let close = match items.nth(3) {
        Some(KlinesItemInner::String(s)) => s
            .parse::<f64>()
            .map_err(|e| FetchError::Decode(format!("close price '{}': {}", s, e)))?,
        _ => return Err(FetchError::Decode("close price missing".into())),
    };
    Ok(SeriesPoint::new(TimeUtils::ms_to_time_key(open_time_ms), close))
}

fn classify_error(e: anyhow::Error, symbol: &str) -> FetchError {
    let Some(conn_err) = e.downcast_ref::<errors::ConnectorError>() else {
        log::error!("An unexpected error occurred for {}: {:#}", symbol, e);
        return FetchError::Network(e.to_string());
    };
    match conn_err {
        connection_error::TooManyRequestsError(msg) | connection_error::RateLimitBanError(msg) => {
            log::warn!("{} Rate limit exceeded. {}", symbol, msg);
            FetchError::RateLimited(msg.clone())
        }
        connection_error::BadRequestError(msg)
        | connection_error::ConnectorClientError(msg)
        | connection_error::NotFoundError(msg) => {
            log::warn!("{} Bad request: Verify symbol and interval. {}", symbol, msg);
            FetchError::Unsupported(msg.clone())
        }
        errors::ConnectorError::ServerError { msg, status_code } => {
            log::error!(
                "{} Server error: {} (status code: {:?})",
                symbol,
                msg,
                status_code
            );
            FetchError::Network(msg.clone())
        }
        other => {
            log::error!("{} Connection failed: {}", symbol, other);
            FetchError::Network(other.to_string())
        }
    }
}

#[async_trait]
impl HistoricalSource for BinanceSource {
    async fn fetch(
        &self,
        symbol: &str,
        period: Period,
        end_time: Option<TimeKey>,
        limit: usize,
    ) -> Result<Vec<SeriesPoint>, FetchError> {
        // klines_limit fits in i32, so the cast cannot wrap
        let limit = limit.clamp(1, self.max_page_size()) as i32;
        self.limiter
            .acquire(BINANCE.limits.kline_call_weight, symbol)
            .await;

        let params = KlinesParams::builder(symbol.to_uppercase(), interval_for(period))
            .limit(limit)
            .end_time(end_time.map(TimeUtils::time_key_to_ms))
            .build()
            .map_err(|e| FetchError::Unsupported(e.to_string()))?;

        let response = self
            .client
            .klines(params)
            .await
            .map_err(|e| classify_error(e, symbol))?;
        let rows = response
            .data()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let mut points = rows
            .into_iter()
            .map(kline_to_point)
            .collect::<Result<Vec<_>, _>>()?;
        // The endpoint already answers ascending; keep the contract even if it stops doing so
        points.sort_by_key(|p| p.time);

        #[cfg(debug_assertions)]
        if DF.log_pagination {
            log::info!(
                "🌐 BINANCE: {} {} -> {} klines (end {:?})",
                symbol,
                period,
                points.len(),
                end_time
            );
        }
        Ok(points)
    }

    fn name(&self) -> &'static str {
        "binance"
    }

    fn max_page_size(&self) -> usize {
        BINANCE.limits.klines_limit.max(1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(open_ms: i64, close: &str) -> Vec<KlinesItemInner> {
        vec![
            KlinesItemInner::Integer(open_ms),
            KlinesItemInner::String("1.0".into()),
            KlinesItemInner::String("2.0".into()),
            KlinesItemInner::String("0.5".into()),
            KlinesItemInner::String(close.into()),
            KlinesItemInner::String("100".into()),
            KlinesItemInner::Integer(open_ms + 59_999),
        ]
    }

    #[test]
    fn row_maps_to_close_in_seconds() {
        let point = kline_to_point(row(1_700_000_000_000, "37123.45")).unwrap();
        assert_eq!(point.time, 1_700_000_000);
        assert_eq!(point.value, 37_123.45);
    }

    #[test]
    fn malformed_rows_are_decode_errors() {
        assert!(matches!(kline_to_point(vec![]), Err(FetchError::Decode(_))));
        assert!(matches!(
            kline_to_point(row(0, "not-a-number")),
            Err(FetchError::Decode(_))
        ));
        let mut short = row(0, "1");
        short.truncate(3);
        assert!(matches!(kline_to_point(short), Err(FetchError::Decode(_))));
    }
}
