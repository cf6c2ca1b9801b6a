//! # omni-wallet — fee estimation and coin selection.
//!
//! Builds unsigned Bitcoin transaction skeletons, estimates their virtual
//! size before signing by substituting placeholder signatures per script
//! type, turns that into a fee, and selects coins for object-model chains.
//!
//! # Modules
//!
//! - [`skeleton`] — append-only unsigned transaction under construction
//! - [`script_type`] — previous-output script classification
//! - [`size`] — placeholder-based weight and vsize estimation
//! - [`fee`] — sat/vB fee rates
//! - [`resolver`] — previous-output lookup and memoization
//! - [`coin_selection`] — greedy selection with exact-match shortcut

pub mod coin_selection;
pub mod fee;
pub mod resolver;
pub mod script_type;
pub mod size;
pub mod skeleton;

pub use coin_selection::{CoinRecord, PickedCoins, pickup_coins, pickup_coins_from_source};
pub use fee::{FeeRate, MIN_RELAY_FEE_RATE};
pub use resolver::{CachedResolver, PrevOutResolver, RawTxResolver};
pub use script_type::ScriptType;
pub use size::{ByScriptType, InputSigSize, PlaceholderSizer, estimate_vsize, estimate_weight};
pub use skeleton::{TransactionSkeleton, UnsignedInput, UnsignedOutput};
