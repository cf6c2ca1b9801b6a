//! JSON-RPC reachability probe over HTTP.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use omni_core::error::ReachError;
use omni_core::traits::{ProbeSample, RpcReachability};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::trace;

/// Which height-reporting RPC a probe calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeightMethod {
    /// EVM chains.
    EthBlockNumber,
    /// Sui: total transaction blocks stands in for a height.
    SuiTotalTransactionBlocks,
    /// bitcoind-compatible nodes.
    BitcoinBlockCount,
    Custom(String),
}

impl HeightMethod {
    pub fn method_name(&self) -> &str {
        match self {
            Self::EthBlockNumber => "eth_blockNumber",
            Self::SuiTotalTransactionBlocks => "sui_getTotalTransactionBlocks",
            Self::BitcoinBlockCount => "getblockcount",
            Self::Custom(name) => name,
        }
    }
}

/// Probes an endpoint with one parameterless JSON-RPC call and times it.
#[derive(Debug, Clone)]
pub struct HttpReachability {
    client: Client,
    method: HeightMethod,
}

impl HttpReachability {
    pub fn new(method: HeightMethod) -> Self {
        Self::with_client(Client::new(), method)
    }

    pub fn with_client(client: Client, method: HeightMethod) -> Self {
        Self { client, method }
    }

    pub fn method(&self) -> &HeightMethod {
        &self.method
    }

    async fn call(&self, url: &str, timeout: Duration) -> Result<Value, ReachError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": self.method.method_name(),
            "params": [],
            "id": 1
        });
        let timeout_ms = timeout.as_millis() as u64;
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                ReachError::Timeout(timeout_ms)
            } else {
                ReachError::Transport(e.to_string())
            }
        };

        let resp: Value = self
            .client
            .post(url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_err)?
            .error_for_status()
            .map_err(map_err)?
            .json()
            .await
            .map_err(map_err)?;

        if let Some(err) = resp.get("error") {
            if !err.is_null() {
                return Err(ReachError::Rpc(err.to_string()));
            }
        }
        Ok(resp.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl RpcReachability for HttpReachability {
    async fn latency_of(&self, url: &str, timeout: Duration) -> Result<ProbeSample, ReachError> {
        let started = Instant::now();
        let result = self.call(url, timeout).await?;
        let latency_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
        let height = parse_height(&result)?;
        trace!(url, latency_ms, height, method = self.method.method_name(), "probe answered");
        Ok(ProbeSample { latency_ms, height })
    }
}

/// Read a height from a JSON-RPC result.
///
/// Accepts a JSON number, a decimal string (Sui) or a `0x` hex string (EVM).
pub fn parse_height(value: &Value) -> Result<i64, ReachError> {
    let invalid = || ReachError::InvalidHeight(value.to_string());
    match value {
        Value::Number(n) => n.as_i64().filter(|h| *h >= 0).ok_or_else(invalid),
        Value::String(s) => {
            let s = s.trim();
            let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => i64::from_str_radix(hex, 16),
                None => s.parse::<i64>(),
            };
            parsed.ok().filter(|h| *h >= 0).ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names() {
        assert_eq!(HeightMethod::EthBlockNumber.method_name(), "eth_blockNumber");
        assert_eq!(
            HeightMethod::SuiTotalTransactionBlocks.method_name(),
            "sui_getTotalTransactionBlocks"
        );
        assert_eq!(HeightMethod::BitcoinBlockCount.method_name(), "getblockcount");
        assert_eq!(HeightMethod::Custom("getinfo".into()).method_name(), "getinfo");
    }

    #[test]
    fn parses_hex_heights() {
        assert_eq!(parse_height(&json!("0x10d4f")).unwrap(), 68_943);
        assert_eq!(parse_height(&json!("0x0")).unwrap(), 0);
    }

    #[test]
    fn parses_decimal_and_numeric_heights() {
        assert_eq!(parse_height(&json!("1234567")).unwrap(), 1_234_567);
        assert_eq!(parse_height(&json!(840_000)).unwrap(), 840_000);
    }

    #[test]
    fn rejects_garbage() {
        for bad in [json!(null), json!("0xzz"), json!("tall"), json!(-5), json!(1.5), json!({})] {
            assert!(matches!(parse_height(&bad), Err(ReachError::InvalidHeight(_))), "{bad}");
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let probe = HttpReachability::new(HeightMethod::EthBlockNumber);
        let err = probe
            .latency_of("http://127.0.0.1:1", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, ReachError::Transport(_) | ReachError::Timeout(_)));
    }
}
