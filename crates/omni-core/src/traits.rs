//! Trait interfaces between Omni and the chain facades.
//!
//! - [`RpcReachability`] — one latency probe against one endpoint (omni-network implements)
//! - [`Balance`] — anything coin selection can weigh
//! - [`CoinSource`] — already-fetched spendable coins for an owner

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CoinSelectionError, ReachError};

/// Outcome of a single successful probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSample {
    /// Round-trip time in milliseconds.
    pub latency_ms: i64,
    /// Chain height reported by the endpoint.
    pub height: i64,
}

/// Measures how long one probe of `url` takes.
///
/// Implementations enforce `timeout` themselves; the monitor never cancels
/// an in-flight call.
#[async_trait]
pub trait RpcReachability: Send + Sync {
    async fn latency_of(&self, url: &str, timeout: Duration) -> Result<ProbeSample, ReachError>;
}

/// A spendable object with a balance in the asset's smallest unit.
pub trait Balance {
    fn balance(&self) -> u64;
}

/// Supplies the spendable coins of `owner` for `coin_type`.
///
/// Fetching and pagination happen behind this trait; selection only sorts
/// and picks from what it is handed.
pub trait CoinSource: Send + Sync {
    type Coin: Balance + Clone;

    fn coins(&self, owner: &str, coin_type: &str) -> Result<Vec<Self::Coin>, CoinSelectionError>;
}
