//! Order book volume imbalance.

use crate::book::{OrderBookSnapshot, PriceLevel};

/// Imbalance above which the viewer classifies the book as bullish.
///
/// Note the cutoff is not zero: values between 0 and 0.5 classify as
/// bearish.
pub const BULLISH_THRESHOLD: f64 = 0.5;

/// Normalized difference between total bid and ask volume, in [-1, 1].
///
/// `(Σ bid qty − Σ ask qty) / (Σ bid qty + Σ ask qty)`
///
/// Stateless and order-independent; recomputed on every snapshot. A zero
/// total volume yields 0.0 rather than dividing by zero. Malformed
/// quantity text propagates as `NaN`, which callers must treat as
/// indeterminate and skip (see `session::SessionState::apply`).
pub fn volume_imbalance(snapshot: &OrderBookSnapshot) -> f64 {
    let total_bid: f64 = snapshot.bids.iter().map(PriceLevel::qty_f64).sum();
    let total_ask: f64 = snapshot.asks.iter().map(PriceLevel::qty_f64).sum();

    let total = total_bid + total_ask;
    if total == 0.0 {
        return 0.0;
    }
    (total_bid - total_ask) / total
}

/// Whether an imbalance value classifies as bullish for display.
pub fn is_bullish(imbalance: f64) -> bool {
    imbalance > BULLISH_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::PriceLevel;

    fn snapshot(bids: &[(&str, &str)], asks: &[(&str, &str)]) -> OrderBookSnapshot {
        OrderBookSnapshot {
            bids: bids.iter().map(|(p, q)| PriceLevel::new(*p, *q)).collect(),
            asks: asks.iter().map(|(p, q)| PriceLevel::new(*p, *q)).collect(),
        }
    }

    #[test]
    fn test_two_level_book() {
        // bids 2.0 + 1.0, asks 3.0 + 1.0 -> (3 - 4) / 7
        let snap = snapshot(
            &[("100.00", "2.0"), ("99.00", "1.0")],
            &[("101.00", "3.0"), ("102.00", "1.0")],
        );
        let imbalance = volume_imbalance(&snap);
        assert!((imbalance - (-1.0 / 7.0)).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_single_level_book() {
        let snap = snapshot(&[("50", "5")], &[("51", "5")]);
        assert_eq!(volume_imbalance(&snap), 0.0);
    }

    #[test]
    fn test_invariant_under_reordering() {
        let a = snapshot(
            &[("100", "2.0"), ("99", "1.0"), ("98", "4.5")],
            &[("101", "3.0"), ("102", "1.0")],
        );
        let b = snapshot(
            &[("98", "4.5"), ("100", "2.0"), ("99", "1.0")],
            &[("102", "1.0"), ("101", "3.0")],
        );
        assert_eq!(volume_imbalance(&a), volume_imbalance(&b));
    }

    #[test]
    fn test_range_for_positive_volume() {
        let one_sided = snapshot(&[("100", "7.0")], &[("101", "0.0")]);
        assert_eq!(volume_imbalance(&one_sided), 1.0);

        let other_side = snapshot(&[("100", "0.0")], &[("101", "7.0")]);
        assert_eq!(volume_imbalance(&other_side), -1.0);
    }

    #[test]
    fn test_zero_volume_guard() {
        let snap = snapshot(&[("100", "0.0")], &[("101", "0.0")]);
        assert_eq!(volume_imbalance(&snap), 0.0);
    }

    #[test]
    fn test_malformed_quantity_propagates_nan() {
        let snap = snapshot(&[("100", "bogus")], &[("101", "3.0")]);
        assert!(volume_imbalance(&snap).is_nan());
    }

    #[test]
    fn test_bullish_classification_boundary() {
        assert!(!is_bullish(0.5));
        assert!(is_bullish(0.500001));
        assert!(!is_bullish(0.2));
        assert!(!is_bullish(-0.8));
    }
}
