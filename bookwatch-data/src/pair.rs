use serde::{Deserialize, Serialize};

/// Supported trading pairs.
///
/// This is a closed set: the viewer only offers symbols the depth endpoint
/// is known to serve, and pair selection cycles through [`TradingPair::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum TradingPair {
    BtcUsdt,
    EthUsdt,
    XrpUsdt,
}

impl TradingPair {
    pub const ALL: [TradingPair; 3] = [
        TradingPair::BtcUsdt,
        TradingPair::EthUsdt,
        TradingPair::XrpUsdt,
    ];

    /// Exchange symbol as used in REST query strings.
    pub fn symbol(&self) -> &'static str {
        match self {
            TradingPair::BtcUsdt => "BTCUSDT",
            TradingPair::EthUsdt => "ETHUSDT",
            TradingPair::XrpUsdt => "XRPUSDT",
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            TradingPair::BtcUsdt => "BTC/USDT",
            TradingPair::EthUsdt => "ETH/USDT",
            TradingPair::XrpUsdt => "XRP/USDT",
        }
    }

    /// Base asset ticker (e.g. "BTC").
    pub fn base(&self) -> &'static str {
        match self {
            TradingPair::BtcUsdt => "BTC",
            TradingPair::EthUsdt => "ETH",
            TradingPair::XrpUsdt => "XRP",
        }
    }

    /// The next pair in display order, wrapping around.
    pub fn next(&self) -> TradingPair {
        match self {
            TradingPair::BtcUsdt => TradingPair::EthUsdt,
            TradingPair::EthUsdt => TradingPair::XrpUsdt,
            TradingPair::XrpUsdt => TradingPair::BtcUsdt,
        }
    }

    /// The previous pair in display order, wrapping around.
    pub fn prev(&self) -> TradingPair {
        match self {
            TradingPair::BtcUsdt => TradingPair::XrpUsdt,
            TradingPair::EthUsdt => TradingPair::BtcUsdt,
            TradingPair::XrpUsdt => TradingPair::EthUsdt,
        }
    }
}

impl std::fmt::Display for TradingPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
