//! Error types for the Omni wallet core.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    #[error("unsupported script for input {index}: {script_hex}")] UnsupportedScript { index: usize, script_hex: String },
    #[error("malformed previous transaction: {0}")] MalformedPrevTx(String),
    #[error("previous output {vout} not found in transaction {txid}")] MissingPrevOut { txid: String, vout: u32 },
    #[error("unknown previous output: {0}")] UnknownPrevOut(String),
    #[error("invalid address: {0}")] InvalidAddress(String),
    #[error("invalid script: {0}")] InvalidScript(String),
    #[error("value overflow")] ValueOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinSelectionError {
    #[error("insufficient account balance: have {have}, need {need}")] InsufficientBalance { have: u64, need: u64 },
    #[error("amount overflow")] AmountOverflow,
    #[error("coin source: {0}")] Source(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReachError {
    #[error("timeout after {0} ms")] Timeout(u64),
    #[error("transport: {0}")] Transport(String),
    #[error("rpc error: {0}")] Rpc(String),
    #[error("invalid height: {0}")] InvalidHeight(String),
    #[error("monitor already running")] AlreadyRunning,
    #[error("config: {0}")] Config(String),
    #[error("runtime: {0}")] Runtime(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("task {index} failed: {reason}")] Failed { index: usize, reason: String },
}
