use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `bookwatch-data`.
///
/// None of these are fatal to the viewer: a failed or invalid fetch is
/// recovered locally by substituting [`crate::OrderBookSnapshot::fallback`],
/// and the fixed polling interval acts as the retry mechanism.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum DataError {
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("malformed payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for DataError {
    fn from(value: reqwest::Error) -> Self {
        // reqwest decode errors surface as Payload so callers can tell a
        // dead endpoint apart from a misbehaving one in logs
        if value.is_decode() {
            Self::Payload(value.to_string())
        } else {
            Self::Network(value.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(value: serde_json::Error) -> Self {
        Self::Payload(value.to_string())
    }
}
