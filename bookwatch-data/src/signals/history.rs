//! Bounded history of recent snapshots.

use std::collections::VecDeque;

use crate::book::OrderBookSnapshot;

/// Maximum number of snapshots retained.
pub const HISTORY_CAPACITY: usize = 100;

/// Bounded FIFO of full snapshots, newest-first.
///
/// Only the head feeds the depth aggregator today; older entries are
/// retained for replay/analysis. Mutation happens in place, but readers
/// only ever observe history through whole `MarketView` values published
/// per tick, so no partially-updated buffer is visible concurrently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotHistory {
    snapshots: VecDeque<OrderBookSnapshot>,
}

impl SnapshotHistory {
    pub fn new() -> Self {
        Self {
            snapshots: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Prepend `snapshot` as the newest entry, dropping the oldest once
    /// [`HISTORY_CAPACITY`] is exceeded.
    pub fn push(&mut self, snapshot: OrderBookSnapshot) {
        self.snapshots.push_front(snapshot);
        self.snapshots.truncate(HISTORY_CAPACITY);
    }

    /// The most recently pushed snapshot.
    pub fn latest(&self) -> Option<&OrderBookSnapshot> {
        self.snapshots.front()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Newest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = &OrderBookSnapshot> + '_ {
        self.snapshots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::PriceLevel;

    fn snapshot(tag: u32) -> OrderBookSnapshot {
        let price = format!("{tag}.0");
        OrderBookSnapshot {
            bids: vec![PriceLevel::new(price.clone(), "1.0")],
            asks: vec![PriceLevel::new(price, "2.0")],
        }
    }

    #[test]
    fn test_round_trip_head() {
        let mut history = SnapshotHistory::new();
        let snap = snapshot(7);
        history.push(snap.clone());
        assert_eq!(history.latest(), Some(&snap));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_newest_first_and_capacity() {
        let mut history = SnapshotHistory::new();
        for tag in 0..150 {
            history.push(snapshot(tag));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        // Head is always the most recently pushed snapshot
        assert_eq!(history.latest(), Some(&snapshot(149)));
        // Oldest retained entry is the 100th-newest
        assert_eq!(history.iter().last(), Some(&snapshot(50)));
    }

    #[test]
    fn test_iteration_order() {
        let mut history = SnapshotHistory::new();
        history.push(snapshot(1));
        history.push(snapshot(2));
        history.push(snapshot(3));

        let tags: Vec<String> = history
            .iter()
            .map(|snap| snap.bids[0].price.clone())
            .collect();
        assert_eq!(tags, vec!["3.0", "2.0", "1.0"]);
    }
}
