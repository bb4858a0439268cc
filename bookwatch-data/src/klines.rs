//! Daily candle (kline) statistics for the per-day panel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One daily OHLCV candle.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DailyKline {
    pub time_open: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Derived per-day statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyStats {
    /// Close vs open, in percent.
    pub change_pct: f64,
    /// High-low range relative to open, in percent.
    pub volatility_pct: f64,
    /// Estimated traded liquidity in quote currency.
    pub liquidity: f64,
}

/// Volatility classification: <3% low, <7% medium, else high.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityLevel {
    Low,
    Medium,
    High,
}

/// Day-over-day performance direction: >0.5% up, <-0.5% down, else neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Performance {
    Up,
    Down,
    Neutral,
}

impl DailyKline {
    pub fn stats(&self) -> DailyStats {
        let (change_pct, volatility_pct) = if self.open > 0.0 {
            (
                ((self.close - self.open) / self.open) * 100.0,
                ((self.high - self.low) / self.open) * 100.0,
            )
        } else {
            (0.0, 0.0)
        };
        DailyStats {
            change_pct,
            volatility_pct,
            liquidity: self.volume * self.close,
        }
    }
}

impl DailyStats {
    pub fn volatility_level(&self) -> VolatilityLevel {
        if self.volatility_pct < 3.0 {
            VolatilityLevel::Low
        } else if self.volatility_pct < 7.0 {
            VolatilityLevel::Medium
        } else {
            VolatilityLevel::High
        }
    }

    pub fn performance(&self) -> Performance {
        if self.change_pct > 0.5 {
            Performance::Up
        } else if self.change_pct < -0.5 {
            Performance::Down
        } else {
            Performance::Neutral
        }
    }
}
