//! Rolling best bid/ask spread series.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::book::OrderBookSnapshot;

/// Maximum number of (label, value) pairs retained.
pub const SPREAD_WINDOW: usize = 60;

/// Spread direction derived from the last two recorded values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadTrend {
    Widening,
    Narrowing,
    Neutral,
}

/// Bounded time series of bid/ask spreads.
///
/// Two parallel sequences, index-aligned and oldest-first: timestamp labels
/// and spread values. Both are always mutated together so alignment can
/// never drift. Once [`SPREAD_WINDOW`] entries are held, recording a new
/// tick evicts the oldest pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpreadSeries {
    labels: VecDeque<String>,
    values: VecDeque<f64>,
}

impl SpreadSeries {
    pub fn new() -> Self {
        Self {
            labels: VecDeque::with_capacity(SPREAD_WINDOW),
            values: VecDeque::with_capacity(SPREAD_WINDOW),
        }
    }

    /// Record the spread of `snapshot` at `now`.
    ///
    /// Returns the recorded spread, or `None` when it was non-finite
    /// (empty side or malformed price text), in which case the series is
    /// left untouched and the last good state stays displayed.
    pub fn record(&mut self, snapshot: &OrderBookSnapshot, now: DateTime<Utc>) -> Option<f64> {
        let spread = best_spread(snapshot);
        if !spread.is_finite() {
            return None;
        }
        self.push(now.format("%H:%M:%S").to_string(), spread);
        Some(spread)
    }

    /// Append a (label, value) pair, evicting the oldest pair at capacity.
    pub fn push(&mut self, label: String, value: f64) {
        if self.values.len() >= SPREAD_WINDOW {
            self.labels.pop_front();
            self.values.pop_front();
        }
        self.labels.push_back(label);
        self.values.push_back(value);
    }

    /// Widening/narrowing derived from the last two values.
    ///
    /// Fewer than 2 points (or equal values) is Neutral: an empty or
    /// single-point series must not read as "narrowing".
    pub fn trend(&self) -> SpreadTrend {
        let len = self.values.len();
        if len < 2 {
            return SpreadTrend::Neutral;
        }
        let last = self.values[len - 1];
        let prev = self.values[len - 2];
        if last > prev {
            SpreadTrend::Widening
        } else if last < prev {
            SpreadTrend::Narrowing
        } else {
            SpreadTrend::Neutral
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Oldest-first (label, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Oldest-first values as a contiguous buffer for charting.
    pub fn values(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    /// Oldest-first labels.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.iter().map(String::as_str)
    }
}

/// Best ask minus best bid, read from the top of each side.
///
/// The exchange returns both sides best-first, so index 0 is taken as
/// top-of-book without re-sorting. This is deliberately asymmetric with
/// the depth aggregator (which does re-sort): if the upstream feed ever
/// returned unsorted levels this would read the wrong top-of-book; the
/// convention is kept rather than silently corrected.
pub fn best_spread(snapshot: &OrderBookSnapshot) -> f64 {
    match (snapshot.bids.first(), snapshot.asks.first()) {
        (Some(bid), Some(ask)) => ask.price_f64() - bid.price_f64(),
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::PriceLevel;
    use chrono::TimeZone;

    fn snapshot(bids: &[(&str, &str)], asks: &[(&str, &str)]) -> OrderBookSnapshot {
        OrderBookSnapshot {
            bids: bids.iter().map(|(p, q)| PriceLevel::new(*p, *q)).collect(),
            asks: asks.iter().map(|(p, q)| PriceLevel::new(*p, *q)).collect(),
        }
    }

    fn tick_time(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs as i64)
    }

    #[test]
    fn test_best_spread_from_top_of_book() {
        let snap = snapshot(
            &[("100.00", "2.0"), ("99.00", "1.0")],
            &[("101.00", "3.0"), ("102.00", "1.0")],
        );
        assert!((best_spread(&snap) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_record_appends_aligned_pair() {
        let mut series = SpreadSeries::new();
        let snap = snapshot(&[("50", "5")], &[("51", "5")]);
        let recorded = series.record(&snap, tick_time(0));
        assert_eq!(recorded, Some(1.0));
        assert_eq!(series.len(), 1);
        assert_eq!(series.labels().count(), 1);
        assert_eq!(series.iter().next(), Some(("12:00:00", 1.0)));
    }

    #[test]
    fn test_non_finite_spread_skips_update() {
        let mut series = SpreadSeries::new();
        series.push("12:00:00".to_string(), 1.0);

        let snap = snapshot(&[("garbage", "5")], &[("51", "5")]);
        assert_eq!(series.record(&snap, tick_time(1)), None);

        // Last good state retained, labels and values still aligned
        assert_eq!(series.len(), 1);
        assert_eq!(series.latest(), Some(1.0));
    }

    #[test]
    fn test_window_eviction_after_61_ticks() {
        let mut series = SpreadSeries::new();
        for tick in 0..61u32 {
            // Distinct spread per tick: ask fixed, bid walks down
            let bid = format!("{}", 100.0 - tick as f64);
            let snap = snapshot(&[(bid.as_str(), "1.0")], &[("101.0", "1.0")]);
            series.record(&snap, tick_time(tick));
        }

        assert_eq!(series.len(), SPREAD_WINDOW);
        assert_eq!(series.labels().count(), SPREAD_WINDOW);
        // Tick 1's value (spread = 1.0) was evicted; head is tick 2's (2.0)
        assert_eq!(series.values()[0], 2.0);
        assert_eq!(series.latest(), Some(61.0));
    }

    #[test]
    fn test_trend_requires_two_points() {
        let mut series = SpreadSeries::new();
        assert_eq!(series.trend(), SpreadTrend::Neutral);

        series.push("a".to_string(), 1.0);
        assert_eq!(series.trend(), SpreadTrend::Neutral);

        series.push("b".to_string(), 2.0);
        assert_eq!(series.trend(), SpreadTrend::Widening);

        series.push("c".to_string(), 0.5);
        assert_eq!(series.trend(), SpreadTrend::Narrowing);

        series.push("d".to_string(), 0.5);
        assert_eq!(series.trend(), SpreadTrend::Neutral);
    }
}
