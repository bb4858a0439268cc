//! REST client for the exchange's public market data endpoints.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

use crate::book::{OrderBookSnapshot, RawDepth};
use crate::error::DataError;
use crate::klines::DailyKline;
use crate::pair::TradingPair;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Per-request timeout; an expired fetch falls back to the sample snapshot
/// rather than leaving stale state displayed indefinitely.
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Thin wrapper over [`reqwest::Client`] for the depth and kline endpoints.
///
/// The base URL is overridable via `BOOKWATCH_API_URL` (and directly in
/// tests via [`BinanceClient::with_base_url`]).
#[derive(Debug, Clone)]
pub struct BinanceClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BinanceClient {
    pub fn new() -> Self {
        let base_url =
            std::env::var("BOOKWATCH_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Fetch and validate a full order book snapshot.
    pub async fn fetch_depth(
        &self,
        pair: TradingPair,
        limit: u32,
    ) -> Result<OrderBookSnapshot, DataError> {
        let url = format!(
            "{}/api/v3/depth?symbol={}&limit={}",
            self.base_url,
            pair.symbol(),
            limit
        );
        debug!(%pair, limit, "fetching depth snapshot");

        let raw: RawDepth = self
            .http
            .get(&url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        OrderBookSnapshot::try_from(raw)
    }

    /// Fetch the most recent daily candles, oldest-first.
    pub async fn fetch_daily_klines(
        &self,
        pair: TradingPair,
        limit: u32,
    ) -> Result<Vec<DailyKline>, DataError> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval=1d&limit={}",
            self.base_url,
            pair.symbol(),
            limit
        );
        debug!(%pair, limit, "fetching daily klines");

        let rows: Vec<Vec<Value>> = self
            .http
            .get(&url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        rows.into_iter().map(parse_kline_row).collect()
    }
}

/// Decode one kline row.
///
/// The endpoint returns heterogeneous arrays:
/// `[open_time_ms, "open", "high", "low", "close", "volume", close_time, ...]`
fn parse_kline_row(row: Vec<Value>) -> Result<DailyKline, DataError> {
    if row.len() < 6 {
        return Err(DataError::Payload(format!(
            "kline row too short: {} fields",
            row.len()
        )));
    }

    let millis = row[0]
        .as_i64()
        .ok_or_else(|| DataError::Payload("kline open time is not an integer".to_string()))?;
    let time_open = Utc
        .timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| DataError::Payload(format!("kline open time out of range: {millis}")))?;

    let field = |index: usize, name: &str| -> Result<f64, DataError> {
        row[index]
            .as_str()
            .and_then(|text| text.parse().ok())
            .ok_or_else(|| DataError::Payload(format!("kline {name} is not numeric text")))
    };

    Ok(DailyKline {
        time_open,
        open: field(1, "open")?,
        high: field(2, "high")?,
        low: field(3, "low")?,
        close: field(4, "close")?,
        volume: field(5, "volume")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kline_row() {
        let row: Vec<Value> = vec![
            json!(1717200000000i64),
            json!("100.0"),
            json!("110.0"),
            json!("95.0"),
            json!("104.0"),
            json!("2.5"),
            json!(1717286399999i64),
        ];

        let kline = parse_kline_row(row).unwrap();
        assert_eq!(kline.open, 100.0);
        assert_eq!(kline.volume, 2.5);
        assert_eq!(kline.time_open.timestamp_millis(), 1717200000000);
    }

    #[test]
    fn test_parse_kline_row_rejects_bad_shapes() {
        assert!(matches!(
            parse_kline_row(vec![json!(1)]),
            Err(DataError::Payload(_))
        ));

        let row = vec![
            json!("not-a-timestamp"),
            json!("1"),
            json!("1"),
            json!("1"),
            json!("1"),
            json!("1"),
        ];
        assert!(matches!(parse_kline_row(row), Err(DataError::Payload(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BinanceClient::with_base_url("http://127.0.0.1:9/");
        assert_eq!(client.base_url, "http://127.0.0.1:9");
    }
}
