//! Shared fixtures for the integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::{Amount, Network, OutPoint, ScriptBuf, TxOut, Txid};
use omni_core::error::ReachError;
use omni_core::traits::{ProbeSample, RpcReachability};
use omni_wallet::{CoinRecord, TransactionSkeleton};
use parking_lot::Mutex;

/// Install a test-writer subscriber honouring `RUST_LOG`. Safe to call twice.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const SUI: &str = "0x2::sui::SUI";

pub fn coin(id: usize, balance: u64) -> CoinRecord {
    CoinRecord {
        coin_type: SUI.to_string(),
        object_id: format!("0x{id:064x}"),
        version: 1,
        digest: format!("digest-{id}"),
        balance,
    }
}

pub fn coins(balances: &[u64]) -> Vec<CoinRecord> {
    balances.iter().enumerate().map(|(i, b)| coin(i, *b)).collect()
}

fn script(prefix: &[u8], body: u8, body_len: usize, suffix: &[u8]) -> ScriptBuf {
    let mut bytes = prefix.to_vec();
    bytes.extend(std::iter::repeat_n(body, body_len));
    bytes.extend_from_slice(suffix);
    ScriptBuf::from_bytes(bytes)
}

pub fn p2pkh_script() -> ScriptBuf {
    script(&[0x76, 0xa9, 0x14], 0x11, 20, &[0x88, 0xac])
}

/// Treated as P2SH-wrapped P2WPKH by the estimator.
pub fn p2sh_script() -> ScriptBuf {
    script(&[0xa9, 0x14], 0x22, 20, &[0x87])
}

pub fn p2wpkh_script() -> ScriptBuf {
    script(&[0x00, 0x14], 0x33, 20, &[])
}

pub fn p2tr_script() -> ScriptBuf {
    script(&[0x51, 0x20], 0x44, 32, &[])
}

pub fn p2wsh_script() -> ScriptBuf {
    script(&[0x00, 0x20], 0x55, 32, &[])
}

pub fn outpoint(seed: u8, vout: u32) -> OutPoint {
    OutPoint::new(Txid::from_byte_array([seed; 32]), vout)
}

pub fn prev_out(script_pubkey: ScriptBuf, sats: u64) -> TxOut {
    TxOut { value: Amount::from_sat(sats), script_pubkey }
}

/// Skeleton spending one output per entry of `inputs` to one P2WPKH output.
pub fn skeleton(inputs: &[ScriptBuf]) -> TransactionSkeleton {
    let mut sk = TransactionSkeleton::new(Network::Bitcoin);
    for (i, s) in inputs.iter().enumerate() {
        sk.add_input(outpoint(i as u8, i as u32), prev_out(s.clone(), 50_000));
    }
    sk.add_output_script(p2wpkh_script(), 10_000);
    sk
}

/// In-memory endpoint set: known URLs answer with a fixed latency after an
/// optional pause, unknown URLs fail.
#[derive(Default)]
pub struct StubReachability {
    latencies: HashMap<String, i64>,
    pause: Duration,
    height: i64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    calls: Mutex<HashMap<String, usize>>,
}

impl StubReachability {
    pub fn new() -> Self {
        Self { height: 1_000, ..Self::default() }
    }

    pub fn with_endpoint(mut self, url: &str, latency_ms: i64) -> Self {
        self.latencies.insert(url.to_string(), latency_ms);
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().get(url).copied().unwrap_or(0)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RpcReachability for StubReachability {
    async fn latency_of(&self, url: &str, _timeout: Duration) -> Result<ProbeSample, ReachError> {
        *self.calls.lock().entry(url.to_string()).or_insert(0) += 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.latencies.get(url) {
            Some(&latency_ms) => Ok(ProbeSample { latency_ms, height: self.height }),
            None => Err(ReachError::Transport(format!("{url}: connection refused"))),
        }
    }
}
