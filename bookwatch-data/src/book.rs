//! Order book snapshot model and parser/validator.
//!
//! The exchange transports prices and quantities as numeric text to avoid
//! floating-point transport artifacts. Levels keep that text verbatim; it
//! is parsed to `f64` only at computation time, and malformed text parses
//! to `NaN` rather than being sanitized, so downstream calculators can
//! detect and skip the affected tick.

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// A single price level: price and available quantity, both as the
/// exchange-formatted decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct PriceLevel {
    pub price: String,
    pub qty: String,
}

impl PriceLevel {
    pub fn new(price: impl Into<String>, qty: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            qty: qty.into(),
        }
    }

    /// Price parsed to `f64`; `NaN` when the text is not a number.
    pub fn price_f64(&self) -> f64 {
        self.price.parse().unwrap_or(f64::NAN)
    }

    /// Quantity parsed to `f64`; `NaN` when the text is not a number.
    pub fn qty_f64(&self) -> f64 {
        self.qty.parse().unwrap_or(f64::NAN)
    }
}

impl From<(String, String)> for PriceLevel {
    fn from((price, qty): (String, String)) -> Self {
        Self { price, qty }
    }
}

impl From<PriceLevel> for (String, String) {
    fn from(level: PriceLevel) -> Self {
        (level.price, level.qty)
    }
}

/// Wire shape of the depth endpoint response.
///
/// `bids`/`asks` default to empty when absent so a missing side is reported
/// as [`DataError::InvalidSnapshot`] rather than a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDepth {
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
    #[serde(default, rename = "lastUpdateId")]
    pub last_update_id: u64,
}

/// A complete, non-incremental view of the order book at one point in time.
///
/// Each poll tick is a full replacement snapshot; there is no delta/diff
/// reconciliation. Valid snapshots have at least one level on each side.
/// No ordering invariant holds on the level lists themselves: the depth
/// aggregator re-sorts, while the spread tracker trusts the exchange's
/// best-first convention (see `signals::spread`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrderBookSnapshot {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

/// Built-in sample book, substituted whenever a live snapshot cannot be
/// fetched so the viewer always has a renderable state.
const FALLBACK_BIDS: [(&str, &str); 5] = [
    ("0.06630900", "6.39500000"),
    ("0.06630800", "10.70410000"),
    ("0.06630600", "12.67180000"),
    ("0.06630500", "1.00000000"),
    ("0.06630400", "0.16000000"),
];

const FALLBACK_ASKS: [(&str, &str); 5] = [
    ("0.06631000", "3.61070000"),
    ("0.06631200", "1.17870000"),
    ("0.06631300", "34.50000000"),
    ("0.06631400", "0.05000000"),
    ("0.06631500", "0.32950000"),
];

impl OrderBookSnapshot {
    /// The hard-coded fallback snapshot.
    pub fn fallback() -> Self {
        let level = |(price, qty): &(&str, &str)| PriceLevel::new(*price, *qty);
        Self {
            bids: FALLBACK_BIDS.iter().map(level).collect(),
            asks: FALLBACK_ASKS.iter().map(level).collect(),
        }
    }
}

impl TryFrom<RawDepth> for OrderBookSnapshot {
    type Error = DataError;

    fn try_from(raw: RawDepth) -> Result<Self, Self::Error> {
        if raw.bids.is_empty() {
            return Err(DataError::InvalidSnapshot("empty bid side".to_string()));
        }
        if raw.asks.is_empty() {
            return Err(DataError::InvalidSnapshot("empty ask side".to_string()));
        }
        Ok(Self {
            bids: raw.bids,
            asks: raw.asks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(bids: &[(&str, &str)], asks: &[(&str, &str)]) -> OrderBookSnapshot {
        OrderBookSnapshot {
            bids: bids.iter().map(|(p, q)| PriceLevel::new(*p, *q)).collect(),
            asks: asks.iter().map(|(p, q)| PriceLevel::new(*p, *q)).collect(),
        }
    }

    #[test]
    fn test_deserialize_depth_response() {
        let raw: RawDepth = serde_json::from_str(
            r#"{
                "lastUpdateId": 5018335298,
                "bids": [["100.00", "2.0"], ["99.00", "1.0"]],
                "asks": [["101.00", "3.0"]]
            }"#,
        )
        .unwrap();

        let snap = OrderBookSnapshot::try_from(raw).unwrap();
        assert_eq!(snap.bids.len(), 2);
        assert_eq!(snap.asks.len(), 1);
        // String formatting preserved verbatim, no trimming or reformatting
        assert_eq!(snap.bids[0].price, "100.00");
        assert_eq!(snap.asks[0].qty, "3.0");
    }

    #[test]
    fn test_empty_side_is_invalid() {
        let raw: RawDepth = serde_json::from_str(r#"{"bids": [], "asks": [["1", "1"]]}"#).unwrap();
        assert_eq!(
            OrderBookSnapshot::try_from(raw),
            Err(DataError::InvalidSnapshot("empty bid side".to_string()))
        );

        // Absent side behaves the same as an empty one
        let raw: RawDepth = serde_json::from_str(r#"{"bids": [["1", "1"]]}"#).unwrap();
        assert!(matches!(
            OrderBookSnapshot::try_from(raw),
            Err(DataError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_level_parse_to_nan_on_malformed_text() {
        let level = PriceLevel::new("not-a-price", "1.5");
        assert!(level.price_f64().is_nan());
        assert_eq!(level.qty_f64(), 1.5);
    }

    #[test]
    fn test_fallback_snapshot_is_valid() {
        let snap = OrderBookSnapshot::fallback();
        assert_eq!(snap.bids.len(), 5);
        assert_eq!(snap.asks.len(), 5);
        assert_eq!(snap.bids[0].price, "0.06630900");
        assert_eq!(snap.asks[0].price, "0.06631000");
        for level in snap.bids.iter().chain(snap.asks.iter()) {
            assert!(level.price_f64().is_finite());
            assert!(level.qty_f64().is_finite());
        }
    }

    #[test]
    fn test_snapshot_equality_round_trip() {
        let snap = snapshot(&[("50", "5")], &[("51", "5")]);
        let json = serde_json::to_string(&snap).unwrap();
        let back: OrderBookSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
