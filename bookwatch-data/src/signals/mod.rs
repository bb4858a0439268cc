//! Pure signal calculators and bounded state carriers for the order book
//! pipeline:
//! - `imbalance`: snapshot → scalar buy/sell pressure in [-1, 1]
//! - `spread`: rolling best bid/ask spread series, capped at 60 ticks
//! - `depth`: snapshot → cumulative depth curve for both sides
//! - `history`: bounded FIFO of recent snapshots feeding chart redraws

pub mod depth;
pub mod history;
pub mod imbalance;
pub mod spread;

pub use depth::{DepthCurve, depth_curve};
pub use history::SnapshotHistory;
pub use imbalance::{BULLISH_THRESHOLD, is_bullish, volume_imbalance};
pub use spread::{SpreadSeries, SpreadTrend};
