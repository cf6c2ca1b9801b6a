//! # omni-core — shared foundations for the Omni wallet SDK.
//!
//! # Modules
//!
//! - [`error`] — error enums for sizing, coin selection, reachability and tasks
//! - [`traits`] — `RpcReachability`, `Balance`, `CoinSource`
//! - [`constants`] — placeholder sizes, reachability defaults, sentinels
//! - [`concurrent`] — bounded parallel map with per-item results
//! - [`cache`] — constructor-scoped memoization

pub mod cache;
pub mod concurrent;
pub mod constants;
pub mod error;
pub mod traits;

pub use cache::MemoCache;
pub use concurrent::map_concurrent;
pub use error::{CoinSelectionError, ReachError, SizeError, TaskError};
pub use traits::{Balance, CoinSource, ProbeSample, RpcReachability};
