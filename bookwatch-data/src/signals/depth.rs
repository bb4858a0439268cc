//! Cumulative depth curve aggregation.

use itertools::Itertools;
use serde::Serialize;

use crate::book::{OrderBookSnapshot, PriceLevel};

/// Cumulative depth curve for both book sides over a shared axis.
///
/// The axis is bid prices (sorted best-first, descending) followed by ask
/// prices (sorted best-first, ascending) and is deliberately NOT globally
/// sorted by price: each side's cumulative series occupies its own axis
/// segment with `None` holes over the other side's positions, rendering as
/// two step-like curves on one categorical axis. Prices keep their
/// original exchange formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DepthCurve {
    pub prices: Vec<String>,
    pub cumulative_bids: Vec<Option<f64>>,
    pub cumulative_asks: Vec<Option<f64>>,
}

impl DepthCurve {
    /// Number of axis positions (bid levels + ask levels).
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Axis index where the ask segment starts.
    pub fn ask_offset(&self) -> usize {
        self.cumulative_bids.iter().filter(|v| v.is_some()).count()
    }
}

/// Build the depth curve from a single snapshot.
///
/// Rebuilt from scratch on every tick; input ordering is not trusted, both
/// sides are re-sorted here. Quantities are non-negative so each running
/// sum is monotonically non-decreasing along its walk. A side with exactly
/// one level contributes a single point equal to that level's quantity.
pub fn depth_curve(snapshot: &OrderBookSnapshot) -> DepthCurve {
    let sorted_bids: Vec<&PriceLevel> = snapshot
        .bids
        .iter()
        .sorted_by(|a, b| b.price_f64().total_cmp(&a.price_f64()))
        .collect();
    let sorted_asks: Vec<&PriceLevel> = snapshot
        .asks
        .iter()
        .sorted_by(|a, b| a.price_f64().total_cmp(&b.price_f64()))
        .collect();

    let mut prices = Vec::with_capacity(sorted_bids.len() + sorted_asks.len());
    let mut bid_cumulative = Vec::with_capacity(sorted_bids.len());
    let mut ask_cumulative = Vec::with_capacity(sorted_asks.len());

    let mut bid_total = 0.0;
    for level in &sorted_bids {
        prices.push(level.price.clone());
        bid_total += level.qty_f64();
        bid_cumulative.push(bid_total);
    }

    let mut ask_total = 0.0;
    for level in &sorted_asks {
        prices.push(level.price.clone());
        ask_total += level.qty_f64();
        ask_cumulative.push(ask_total);
    }

    let cumulative_bids = bid_cumulative
        .iter()
        .copied()
        .map(Some)
        .chain(std::iter::repeat_n(None, sorted_asks.len()))
        .collect();
    let cumulative_asks = std::iter::repeat_n(None, sorted_bids.len())
        .chain(ask_cumulative.iter().copied().map(Some))
        .collect();

    DepthCurve {
        prices,
        cumulative_bids,
        cumulative_asks,
    }
}
