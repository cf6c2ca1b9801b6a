//! Protocol constants shared across Omni crates.

/// Probes per URL after the discarded warm-up probe.
pub const DEFAULT_REACH_COUNT: u32 = 1;

/// Per-probe timeout in milliseconds.
pub const DEFAULT_REACH_TIMEOUT_MS: u64 = 20_000;

/// Pause between two consecutive probes of the same URL, in milliseconds.
pub const DEFAULT_REACH_DELAY_MS: u64 = 1_500;

/// Upper bound on simultaneously probed endpoints.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Latency and height sentinel for an endpoint that never answered.
pub const UNREACHABLE: i64 = -1;

/// Schnorr signature pushed as the single taproot key-path witness item.
pub const TAPROOT_WITNESS_SIZE: usize = 64;

/// DER signature plus compressed pubkey push in a P2PKH sigscript.
pub const P2PKH_SIG_SCRIPT_SIZE: usize = 106;

/// Signature and pubkey placeholder carried in a P2WPKH witness.
pub const P2WPKH_WITNESS_SIZE: usize = 108;

/// Push of the 22-byte P2WPKH redeem script in a nested-segwit sigscript.
pub const P2SH_P2WPKH_SIG_SCRIPT_SIZE: usize = 23;

/// Relay floor in satoshis per virtual byte.
pub const MIN_RELAY_SAT_PER_VB: u64 = 1;
