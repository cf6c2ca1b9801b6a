//! # omni-network — RPC endpoint reachability for the Omni wallet SDK.
//!
//! Probes a list of RPC endpoints concurrently, averages their latency and
//! returns them ranked fastest first as JSON.
//!
//! # Modules
//!
//! - [`config`] — run settings with environment overrides
//! - [`latency`] — per-endpoint records and ranking
//! - [`monitor`] — the concurrent prober and its callbacks
//! - [`http`] — JSON-RPC probe over HTTP

pub mod config;
pub mod http;
pub mod latency;
pub mod monitor;

pub use config::ReachConfig;
pub use http::{HeightMethod, HttpReachability, parse_height};
pub use latency::{RpcLatency, rank_latencies, to_ranked_json};
pub use monitor::{MonitorStatus, ReachCallbacks, ReachMonitor, split_rpc_list};
