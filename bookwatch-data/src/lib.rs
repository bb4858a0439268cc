//! Bookwatch Data - order book polling and signal pipeline
//!
//! This library backs the `bookwatch-tui` terminal viewer:
//! - Typed order book snapshots parsed from the Binance REST depth endpoint
//! - Pure signal calculators: volume imbalance, rolling bid/ask spread
//!   series, cumulative depth curve
//! - A bounded snapshot history ring feeding depth chart redraws
//! - A per-pair polling session that publishes whole `MarketView` read
//!   models over a watch channel, falling back to a built-in sample
//!   snapshot whenever the exchange cannot be reached

pub mod book;
pub mod error;
pub mod klines;
pub mod pair;
pub mod rest;
pub mod session;
pub mod signals;

// Re-export commonly used types for convenience
pub use book::{OrderBookSnapshot, PriceLevel, RawDepth};
pub use error::DataError;
pub use klines::{DailyKline, DailyStats, Performance, VolatilityLevel};
pub use pair::TradingPair;
pub use rest::BinanceClient;
pub use session::{DataSource, MarketView, SessionConfig, SessionHandle, SessionState, spawn_session};
pub use signals::depth::{DepthCurve, depth_curve};
pub use signals::history::SnapshotHistory;
pub use signals::imbalance::{BULLISH_THRESHOLD, is_bullish, volume_imbalance};
pub use signals::spread::{SpreadSeries, SpreadTrend};
