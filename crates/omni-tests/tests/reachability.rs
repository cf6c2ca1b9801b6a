//! Integration tests for the reachability monitor.
//!
//! Most tests drive the monitor against an in-memory endpoint set; the last
//! group stands up real JSON-RPC servers with axum and probes them over HTTP.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{Json, Router, routing::post};
use omni_core::error::ReachError;
use omni_network::{
    HeightMethod, HttpReachability, MonitorStatus, ReachCallbacks, ReachConfig, ReachMonitor,
    RpcLatency, rank_latencies,
};
use omni_tests::helpers::*;
use proptest::prelude::*;
use serde_json::{Value, json};

fn config(reach_count: u32, max_concurrency: usize) -> ReachConfig {
    ReachConfig {
        reach_count,
        timeout: Duration::from_millis(500),
        delay: Duration::from_millis(5),
        max_concurrency,
    }
}

#[tokio::test]
async fn ranks_fastest_first_with_failures_last() {
    init_tracing();
    let stub = StubReachability::new()
        .with_endpoint("https://slow", 300)
        .with_endpoint("https://fast", 20)
        .with_endpoint("https://mid", 90);
    let monitor = ReachMonitor::new(config(2, 8), Arc::new(stub));

    let json = monitor
        .start_connectivity("https://down, https://slow,https://fast ,https://mid", ReachCallbacks::new())
        .await;
    let ranked: Vec<RpcLatency> = serde_json::from_str(&json).unwrap();
    let urls: Vec<&str> = ranked.iter().map(|l| l.rpc_url.as_str()).collect();
    assert_eq!(urls, vec!["https://fast", "https://mid", "https://slow", "https://down"]);
    assert_eq!(ranked[3], RpcLatency::unreachable("https://down"));
    assert_eq!(ranked[0].height, 1_000);
}

#[tokio::test]
async fn probes_each_url_reach_count_plus_one_times() {
    let stub = Arc::new(StubReachability::new().with_endpoint("a", 1).with_endpoint("b", 2));
    let monitor = ReachMonitor::new(config(3, 8), stub.clone());

    let failures = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&failures);
    let callbacks = ReachCallbacks::new().on_node_failure(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let ranked = monitor
        .probe(vec!["a".into(), "b".into(), "c".into()], &callbacks)
        .await
        .unwrap();

    assert_eq!(ranked.len(), 3);
    for url in ["a", "b", "c"] {
        assert_eq!(stub.calls(url), 4, "{url}");
    }
    // The warm-up failure of "c" is not reported.
    assert_eq!(failures.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn concurrency_is_bounded() {
    let mut stub = StubReachability::new().with_pause(Duration::from_millis(20));
    let urls: Vec<String> = (0..8).map(|i| format!("https://node-{i}")).collect();
    for url in &urls {
        stub = stub.with_endpoint(url, 10);
    }
    let stub = Arc::new(stub);
    let monitor = ReachMonitor::new(config(1, 3), stub.clone());

    let ranked = monitor.probe(urls, &ReachCallbacks::new()).await.unwrap();
    assert_eq!(ranked.len(), 8);
    assert!(stub.peak_in_flight() <= 3, "peak {}", stub.peak_in_flight());
    assert!(stub.peak_in_flight() >= 2);
}

#[tokio::test]
async fn continuous_run_stops_on_request() {
    let stub = Arc::new(
        StubReachability::new()
            .with_endpoint("a", 15)
            .with_pause(Duration::from_millis(2)),
    );
    let mut cfg = ReachConfig::continuous();
    cfg.delay = Duration::from_millis(5);
    let monitor = Arc::new(ReachMonitor::new(cfg, stub.clone()));

    let successes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&successes);
    let runner = Arc::clone(&monitor);
    let run = tokio::spawn(async move {
        let callbacks = ReachCallbacks::new().on_node_success(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        runner.probe(vec!["a".into(), "b".into()], &callbacks).await
    });

    while successes.load(Ordering::SeqCst) < 3 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(monitor.status(), MonitorStatus::Running);
    assert_eq!(
        monitor.probe(vec!["a".into()], &ReachCallbacks::new()).await,
        Err(ReachError::AlreadyRunning)
    );

    monitor.stop_connectivity();
    let ranked = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run did not stop")
        .unwrap()
        .unwrap();

    assert_eq!(ranked, vec![RpcLatency::new("a", 15, 1_000), RpcLatency::unreachable("b")]);
    assert_eq!(monitor.status(), MonitorStatus::Finished);
    let calls_after_stop = stub.calls("a");
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(stub.calls("a"), calls_after_stop);
}

#[tokio::test]
async fn stopped_before_counted_probe_is_omitted() {
    let stub = Arc::new(StubReachability::new().with_endpoint("a", 5));
    let mut cfg = config(1, 1);
    cfg.delay = Duration::from_millis(200);
    let monitor = Arc::new(ReachMonitor::new(cfg, stub.clone()));

    let runner = Arc::clone(&monitor);
    let run = tokio::spawn(async move { runner.probe(vec!["a".into()], &ReachCallbacks::new()).await });

    // Wait out the warm-up, then stop during the delay.
    while stub.calls("a") == 0 {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    monitor.stop_connectivity();

    let ranked = run.await.unwrap().unwrap();
    assert!(ranked.is_empty());
    assert_eq!(stub.calls("a"), 1);
}

#[tokio::test]
async fn dropped_run_releases_the_monitor() {
    let stub = Arc::new(
        StubReachability::new()
            .with_endpoint("a", 12)
            .with_pause(Duration::from_millis(200)),
    );
    let monitor = ReachMonitor::new(config(1, 4), stub.clone());

    let cut_short = tokio::time::timeout(
        Duration::from_millis(20),
        monitor.start_connectivity("a", ReachCallbacks::new()),
    )
    .await;
    assert!(cut_short.is_err());
    assert_eq!(monitor.status(), MonitorStatus::Finished);

    let json = monitor.start_connectivity("a", ReachCallbacks::new()).await;
    assert_eq!(json, r#"[{"rpcUrl":"a","latency":12,"height":1000}]"#);

    // The orphaned task of the first run stopped after its warm-up probe.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(stub.calls("a"), 3);
}

#[tokio::test]
async fn rejected_run_still_reports_finish() {
    let stub = Arc::new(
        StubReachability::new()
            .with_endpoint("a", 5)
            .with_pause(Duration::from_millis(50)),
    );
    let monitor = Arc::new(ReachMonitor::new(config(1, 4), stub.clone()));

    let runner = Arc::clone(&monitor);
    let run = tokio::spawn(async move { runner.start_connectivity("a", ReachCallbacks::new()).await });
    while stub.calls("a") == 0 {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let finished = Arc::new(parking_lot::Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&finished);
    let callbacks = ReachCallbacks::new().on_finish(move |json| sink.lock().push(json.to_string()));
    let json = monitor.start_connectivity("a", callbacks).await;

    assert_eq!(json, "");
    assert_eq!(*finished.lock(), vec![String::new()]);
    assert_ne!(run.await.unwrap(), "");
}

proptest! {
    #[test]
    fn ranking_is_sorted_and_stable(entries in prop::collection::vec(prop_oneof![Just(-1i64), 0i64..500], 0..20)) {
        let mut list: Vec<RpcLatency> = entries
            .iter()
            .enumerate()
            .map(|(i, &l)| if l < 0 {
                RpcLatency::unreachable(format!("u{i}"))
            } else {
                RpcLatency::new(format!("u{i}"), l, 1)
            })
            .collect();
        rank_latencies(&mut list);

        let first_down = list.iter().position(|l| !l.is_reachable()).unwrap_or(list.len());
        prop_assert!(list[first_down..].iter().all(|l| !l.is_reachable()));
        for pair in list[..first_down].windows(2) {
            prop_assert!(pair[0].latency <= pair[1].latency);
            if pair[0].latency == pair[1].latency {
                let a: usize = pair[0].rpc_url[1..].parse().unwrap();
                let b: usize = pair[1].rpc_url[1..].parse().unwrap();
                prop_assert!(a < b);
            }
        }
    }
}

/// Serves one JSON-RPC method with a fixed result; anything else is an error.
async fn spawn_rpc_server(method: &'static str, result: Value) -> String {
    let app = Router::new().route(
        "/",
        post(move |Json(req): Json<Value>| {
            let result = result.clone();
            async move {
                if req["method"] == method {
                    Json(json!({ "jsonrpc": "2.0", "id": req["id"], "result": result }))
                } else {
                    Json(json!({
                        "jsonrpc": "2.0",
                        "id": req["id"],
                        "error": { "code": -32601, "message": "method not found" }
                    }))
                }
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn http_probe_reads_evm_height() {
    let url = spawn_rpc_server("eth_blockNumber", json!("0x1b4")).await;
    let probe = HttpReachability::new(HeightMethod::EthBlockNumber);
    let sample = omni_core::RpcReachability::latency_of(&probe, &url, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(sample.height, 436);
    assert!(sample.latency_ms >= 0);
}

#[tokio::test]
async fn http_probe_surfaces_rpc_errors() {
    let url = spawn_rpc_server("eth_blockNumber", json!("0x1")).await;
    let probe = HttpReachability::new(HeightMethod::BitcoinBlockCount);
    let err = omni_core::RpcReachability::latency_of(&probe, &url, Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(err, ReachError::Rpc(_)), "{err}");
}

#[tokio::test]
async fn monitor_over_http() {
    let sui = spawn_rpc_server("sui_getTotalTransactionBlocks", json!("2981443127")).await;
    let wrong_chain = spawn_rpc_server("eth_blockNumber", json!("0x10")).await;
    let monitor = ReachMonitor::new(
        config(2, 4),
        Arc::new(HttpReachability::new(HeightMethod::SuiTotalTransactionBlocks)),
    );

    let finished = Arc::new(parking_lot::Mutex::new(None::<String>));
    let sink = Arc::clone(&finished);
    let callbacks = ReachCallbacks::new().on_finish(move |json| *sink.lock() = Some(json.to_string()));
    let json = monitor
        .start_connectivity(&format!("{wrong_chain},{sui}"), callbacks)
        .await;

    let ranked: Vec<HashMap<String, Value>> = serde_json::from_str(&json).unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["rpcUrl"], json!(sui));
    assert_eq!(ranked[0]["height"], json!(2_981_443_127i64));
    assert_eq!(ranked[1]["rpcUrl"], json!(wrong_chain));
    assert_eq!(ranked[1]["latency"], json!(-1));
    assert_eq!(finished.lock().as_deref(), Some(json.as_str()));
}
