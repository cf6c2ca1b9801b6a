//! Per-endpoint latency records and their ranking.
//!
//! A record starts as a tally of probe outcomes and is finalized once the
//! endpoint's probes are done. Finalized records sort by latency ascending
//! with unreachable endpoints (`-1`) last.

use omni_core::constants::UNREACHABLE;
use omni_core::traits::ProbeSample;
use serde::{Deserialize, Serialize};

/// Measured latency and height of one RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLatency {
    pub rpc_url: String,
    /// Milliseconds, or `-1` when unreachable.
    pub latency: i64,
    /// Last observed chain height, or `-1` if none was obtained.
    pub height: i64,
}

impl RpcLatency {
    pub fn new(rpc_url: impl Into<String>, latency: i64, height: i64) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            latency,
            height,
        }
    }

    pub fn unreachable(rpc_url: impl Into<String>) -> Self {
        Self::new(rpc_url, UNREACHABLE, UNREACHABLE)
    }

    pub fn is_reachable(&self) -> bool {
        self.latency != UNREACHABLE
    }
}

/// Sort ascending by latency, unreachable endpoints last. Stable.
pub fn rank_latencies(latencies: &mut [RpcLatency]) {
    latencies.sort_by_key(|l| (!l.is_reachable(), l.latency));
}

/// Serialize an already ranked list as a JSON array.
pub fn to_ranked_json(latencies: &[RpcLatency]) -> Result<String, serde_json::Error> {
    serde_json::to_string(latencies)
}

/// Running tally of one endpoint's counted probes.
#[derive(Debug, Clone)]
pub(crate) struct LatencyTally {
    rpc_url: String,
    latency_sum: i64,
    successes: u32,
    failures: u32,
    height: i64,
}

impl LatencyTally {
    pub(crate) fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            latency_sum: 0,
            successes: 0,
            failures: 0,
            height: UNREACHABLE,
        }
    }

    pub(crate) fn record_success(&mut self, sample: ProbeSample) {
        self.latency_sum = self.latency_sum.saturating_add(sample.latency_ms);
        self.successes += 1;
        self.height = sample.height;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// `None` if no counted probe completed, otherwise the mean latency of
    /// the successful probes and the latest height, or unreachable if every
    /// counted probe failed.
    pub(crate) fn finish(self) -> Option<RpcLatency> {
        if self.successes == 0 && self.failures == 0 {
            return None;
        }
        if self.successes == 0 {
            return Some(RpcLatency::unreachable(self.rpc_url));
        }
        let mean = self.latency_sum / i64::from(self.successes);
        Some(RpcLatency::new(self.rpc_url, mean, self.height))
    }
}
