//! Per-pair polling session.
//!
//! One tokio task per selected trading pair ticks on a fixed interval,
//! fetches a depth snapshot, runs the signal pipeline, and publishes a
//! complete [`MarketView`] through a watch channel. State crosses the task
//! boundary only as whole values (last write wins), so readers can never
//! observe a partially-updated tick. Switching pair cancels the session
//! and spawns a fresh one with empty derived state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::book::{OrderBookSnapshot, PriceLevel};
use crate::klines::DailyKline;
use crate::pair::TradingPair;
use crate::rest::BinanceClient;
use crate::signals::depth::{DepthCurve, depth_curve};
use crate::signals::history::SnapshotHistory;
use crate::signals::imbalance::volume_imbalance;
use crate::signals::spread::SpreadSeries;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_DEPTH_LIMIT: u32 = 10;
pub const DEFAULT_KLINE_DAYS: u32 = 7;

/// Where the snapshot behind the current view came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Live,
    Fallback,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Live => "LIVE",
            DataSource::Fallback => "FALLBACK",
        }
    }
}

/// Read models exposed to the presentation layer, published whole per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketView {
    pub pair: TradingPair,
    /// Current bid levels, passed through in exchange order.
    pub bids: Vec<PriceLevel>,
    /// Current ask levels, passed through in exchange order.
    pub asks: Vec<PriceLevel>,
    /// Last finite imbalance value; 0.0 before the first tick.
    pub imbalance: f64,
    pub spread: SpreadSeries,
    pub depth: DepthCurve,
    /// Daily candles for the stats panel, oldest-first; empty when the
    /// backfill failed.
    pub daily: Vec<DailyKline>,
    pub source: DataSource,
    pub ticks: u64,
    pub time_updated: DateTime<Utc>,
}

impl MarketView {
    /// Pre-first-tick view: everything empty, imbalance 0.
    pub fn empty(pair: TradingPair) -> Self {
        Self {
            pair,
            bids: Vec::new(),
            asks: Vec::new(),
            imbalance: 0.0,
            spread: SpreadSeries::new(),
            depth: DepthCurve::default(),
            daily: Vec::new(),
            source: DataSource::Fallback,
            ticks: 0,
            time_updated: Utc::now(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub pair: TradingPair,
    pub depth_limit: u32,
    pub poll_interval: Duration,
    pub kline_days: u32,
}

impl SessionConfig {
    pub fn new(pair: TradingPair) -> Self {
        Self {
            pair,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            kline_days: DEFAULT_KLINE_DAYS,
        }
    }
}

/// State carried across ticks for one pair: the spread series and snapshot
/// history are the only stateful parts of the pipeline.
#[derive(Debug)]
pub struct SessionState {
    pair: TradingPair,
    imbalance: f64,
    spread: SpreadSeries,
    history: SnapshotHistory,
    daily: Vec<DailyKline>,
    ticks: u64,
}

impl SessionState {
    pub fn new(pair: TradingPair) -> Self {
        Self {
            pair,
            imbalance: 0.0,
            spread: SpreadSeries::new(),
            history: SnapshotHistory::new(),
            daily: Vec::new(),
            ticks: 0,
        }
    }

    pub fn set_daily(&mut self, daily: Vec<DailyKline>) {
        self.daily = daily;
    }

    /// Run one tick of the pipeline and build the resulting view.
    ///
    /// A non-finite imbalance (malformed quantity text) leaves the previous
    /// good value in place; the spread tracker applies the same rule
    /// internally. Fallback snapshots flow through the full pipeline,
    /// history included, so every read model reflects the same book.
    pub fn apply(
        &mut self,
        snapshot: OrderBookSnapshot,
        source: DataSource,
        now: DateTime<Utc>,
    ) -> MarketView {
        let imbalance = volume_imbalance(&snapshot);
        if imbalance.is_finite() {
            self.imbalance = imbalance;
        }

        self.spread.record(&snapshot, now);
        self.history.push(snapshot);
        self.ticks += 1;

        // Depth rebuilds from scratch off the history head (the snapshot
        // just pushed); older entries are kept for replay only
        let (depth, bids, asks) = match self.history.latest() {
            Some(head) => (depth_curve(head), head.bids.clone(), head.asks.clone()),
            None => (DepthCurve::default(), Vec::new(), Vec::new()),
        };

        MarketView {
            pair: self.pair,
            bids,
            asks,
            imbalance: self.imbalance,
            spread: self.spread.clone(),
            depth,
            daily: self.daily.clone(),
            source,
            ticks: self.ticks,
            time_updated: now,
        }
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }
}

/// Handle to a running polling session.
pub struct SessionHandle {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Cancel the session. The flag is observed before any in-flight
    /// response is applied, so a fetch that races the cancellation never
    /// touches published state.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.task.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Spawn the polling task for `config.pair`.
///
/// The first tick fires immediately, then once per poll interval. A slow
/// fetch delays the next tick instead of stacking overlapping fires. Any
/// fetch failure (network, timeout, invalid or empty book) substitutes the
/// built-in sample snapshot so the viewer always has a renderable state.
pub fn spawn_session(
    client: BinanceClient,
    config: SessionConfig,
) -> (SessionHandle, watch::Receiver<MarketView>) {
    let (tx, rx) = watch::channel(MarketView::empty(config.pair));
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancel_flag = Arc::clone(&cancelled);

    let task = tokio::spawn(async move {
        let pair = config.pair;
        let mut state = SessionState::new(pair);

        match client.fetch_daily_klines(pair, config.kline_days).await {
            Ok(daily) => state.set_daily(daily),
            Err(err) => {
                warn!(%pair, %err, "daily kline backfill failed, stats panel stays empty")
            }
        }

        let mut ticker = interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if cancel_flag.load(Ordering::Relaxed) {
                break;
            }

            let (snapshot, source) = match client.fetch_depth(pair, config.depth_limit).await {
                Ok(snapshot) => (snapshot, DataSource::Live),
                Err(err) => {
                    warn!(%pair, %err, "depth fetch failed, substituting fallback snapshot");
                    (OrderBookSnapshot::fallback(), DataSource::Fallback)
                }
            };

            // Checked again after the await: a response for a switched-away
            // pair must not be applied
            if cancel_flag.load(Ordering::Relaxed) {
                break;
            }

            let view = state.apply(snapshot, source, Utc::now());
            if tx.send(view).is_err() {
                break;
            }
        }

        debug!(%pair, "polling session stopped");
    });

    (SessionHandle { cancelled, task }, rx)
}
