//! Concurrent multi-endpoint reachability monitor.
//!
//! Each endpoint gets its own task, bounded by
//! [`ReachConfig::max_concurrency`]. Inside a task the probes run one after
//! another with [`ReachConfig::delay`] between them. The first probe only
//! warms the connection up and is discarded. The remaining probes are
//! averaged over their successes; an endpoint whose counted probes all fail
//! ends up at latency `-1`.
//!
//! # States
//!
//! `Idle` → `Running` → `Finished`. [`ReachMonitor::stop_connectivity`] asks a
//! running monitor to stop: no new probe starts, in-flight probes finish
//! on their own timeout, and the run completes with what it has.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use omni_core::concurrent::map_concurrent;
use omni_core::error::ReachError;
use omni_core::traits::RpcReachability;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::ReachConfig;
use crate::latency::{LatencyTally, RpcLatency, rank_latencies, to_ranked_json};

pub type NodeSuccessFn = dyn Fn(&RpcLatency) + Send + Sync;
pub type NodeFailureFn = dyn Fn(&str, &ReachError) + Send + Sync;
pub type FinishFn = dyn Fn(&str) + Send + Sync;

/// Optional observers of a run. Any subset may be set.
///
/// Per-node callbacks fire once per counted probe and may interleave freely
/// across endpoints. `on_finish` fires once with the ranked JSON.
#[derive(Clone, Default)]
pub struct ReachCallbacks {
    pub on_node_success: Option<Arc<NodeSuccessFn>>,
    pub on_node_failure: Option<Arc<NodeFailureFn>>,
    pub on_finish: Option<Arc<FinishFn>>,
}

impl ReachCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_node_success(mut self, f: impl Fn(&RpcLatency) + Send + Sync + 'static) -> Self {
        self.on_node_success = Some(Arc::new(f));
        self
    }

    pub fn on_node_failure(mut self, f: impl Fn(&str, &ReachError) + Send + Sync + 'static) -> Self {
        self.on_node_failure = Some(Arc::new(f));
        self
    }

    pub fn on_finish(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_finish = Some(Arc::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.on_node_success.is_none() && self.on_node_failure.is_none() && self.on_finish.is_none()
    }
}

impl fmt::Debug for ReachCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReachCallbacks")
            .field("on_node_success", &self.on_node_success.is_some())
            .field("on_node_failure", &self.on_node_failure.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

/// Lifecycle of a [`ReachMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    Idle,
    Running,
    Finished,
}

/// State shared by every endpoint task of one run.
struct ProbeContext {
    config: ReachConfig,
    reachability: Arc<dyn RpcReachability>,
    stopped: Arc<AtomicBool>,
    callbacks: ReachCallbacks,
}

/// Ranks RPC endpoints by measured latency.
///
/// One run at a time per monitor; share it behind an [`Arc`] to stop a run
/// from another task or thread.
pub struct ReachMonitor {
    config: ReachConfig,
    reachability: Arc<dyn RpcReachability>,
    /// Stop flag of the current run; replaced at the start of every run.
    stopped: Mutex<Arc<AtomicBool>>,
    status: Mutex<MonitorStatus>,
}

/// Ends a run when dropped, whether it completed or its future was dropped.
///
/// Raising the run's stop flag makes endpoint tasks orphaned by a dropped
/// future exit before their next probe.
struct RunGuard<'a> {
    status: &'a Mutex<MonitorStatus>,
    stopped: Arc<AtomicBool>,
    completed: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        *self.status.lock() = MonitorStatus::Finished;
        if !self.completed {
            warn!("reach: run dropped before finishing, endpoint tasks told to stop");
        }
    }
}

impl fmt::Debug for ReachMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReachMonitor")
            .field("config", &self.config)
            .field("status", &*self.status.lock())
            .field("stopped", &self.stopped.lock().load(Ordering::Relaxed))
            .finish()
    }
}

impl ReachMonitor {
    pub fn new(config: ReachConfig, reachability: Arc<dyn RpcReachability>) -> Self {
        Self {
            config,
            reachability,
            stopped: Mutex::new(Arc::new(AtomicBool::new(false))),
            status: Mutex::new(MonitorStatus::Idle),
        }
    }

    pub fn config(&self) -> &ReachConfig {
        &self.config
    }

    pub fn status(&self) -> MonitorStatus {
        *self.status.lock()
    }

    /// Ask the current run to stop before its next probe.
    pub fn stop_connectivity(&self) {
        self.stopped.lock().store(true, Ordering::SeqCst);
        info!(status = ?self.status(), "reach: stop requested");
    }

    /// Probe every URL and return the ranked records.
    ///
    /// Endpoints that never completed a counted probe (because the run was
    /// stopped first) are left out.
    ///
    /// Dropping the returned future ends the run: the monitor goes back to
    /// accepting runs and the endpoint tasks stop before their next probe.
    ///
    /// # Errors
    /// [`ReachError::AlreadyRunning`] if this monitor is mid-run.
    pub async fn probe(
        &self,
        urls: Vec<String>,
        callbacks: &ReachCallbacks,
    ) -> Result<Vec<RpcLatency>, ReachError> {
        let mut guard = {
            let mut status = self.status.lock();
            if *status == MonitorStatus::Running {
                return Err(ReachError::AlreadyRunning);
            }
            *status = MonitorStatus::Running;
            let stopped = Arc::new(AtomicBool::new(false));
            *self.stopped.lock() = Arc::clone(&stopped);
            RunGuard {
                status: &self.status,
                stopped,
                completed: false,
            }
        };

        info!(
            endpoints = urls.len(),
            reach_count = self.config.reach_count,
            max_concurrency = self.config.max_concurrency,
            "reach: run started"
        );

        let ctx = Arc::new(ProbeContext {
            config: self.config.clone(),
            reachability: Arc::clone(&self.reachability),
            stopped: Arc::clone(&guard.stopped),
            callbacks: callbacks.clone(),
        });

        let results = map_concurrent(urls, self.config.max_concurrency, move |_, url| {
            let ctx = Arc::clone(&ctx);
            async move { probe_endpoint(&ctx, url).await }
        })
        .await;

        let mut ranked: Vec<RpcLatency> = results
            .into_iter()
            .filter_map(|r| match r {
                Ok(latency) => latency,
                Err(e) => {
                    warn!(error = %e, "reach: endpoint task lost");
                    None
                }
            })
            .collect();
        rank_latencies(&mut ranked);

        guard.completed = true;
        info!(
            ranked = ranked.len(),
            reachable = ranked.iter().filter(|l| l.is_reachable()).count(),
            "reach: run finished"
        );
        Ok(ranked)
    }

    /// Probe a comma-separated list of URLs and return the ranked JSON.
    ///
    /// Never fails: a run that cannot start, or a result that cannot be
    /// serialized, yields an empty string after logging. `on_finish` fires
    /// with whatever is returned.
    pub async fn start_connectivity(&self, rpc_list: &str, callbacks: ReachCallbacks) -> String {
        if callbacks.is_empty() {
            warn!("reach: no callbacks registered, result is only returned");
        }

        let json = match self.probe(split_rpc_list(rpc_list), &callbacks).await {
            Ok(ranked) => to_ranked_json(&ranked).unwrap_or_else(|e| {
                error!(error = %e, "reach: failed to serialize ranking");
                String::new()
            }),
            Err(e) => {
                error!(error = %e, "reach: run not started");
                String::new()
            }
        };
        finish(&callbacks, json)
    }

    /// [`start_connectivity`](Self::start_connectivity) on a private runtime,
    /// blocking the calling thread.
    ///
    /// Must not be called from inside a tokio runtime.
    pub fn start_connectivity_blocking(&self, rpc_list: &str, callbacks: ReachCallbacks) -> String {
        match build_runtime() {
            Ok(runtime) => runtime.block_on(self.start_connectivity(rpc_list, callbacks)),
            Err(e) => {
                error!(error = %e, "reach: run not started");
                finish(&callbacks, String::new())
            }
        }
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime, ReachError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| ReachError::Runtime(e.to_string()))
}

fn finish(callbacks: &ReachCallbacks, json: String) -> String {
    if let Some(on_finish) = &callbacks.on_finish {
        on_finish(&json);
    }
    json
}

/// Split a comma-separated URL list, dropping blanks.
pub fn split_rpc_list(rpc_list: &str) -> Vec<String> {
    rpc_list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

async fn probe_endpoint(ctx: &ProbeContext, url: String) -> Option<RpcLatency> {
    let attempts = ctx.config.attempts();
    let mut tally = LatencyTally::new(url.as_str());
    let mut attempt: u32 = 0;

    loop {
        if attempts.is_some_and(|total| attempt >= total) {
            break;
        }
        if ctx.stopped.load(Ordering::SeqCst) {
            debug!(url = %url, attempt, "reach: stopped before probe");
            break;
        }

        let outcome = ctx.reachability.latency_of(&url, ctx.config.timeout).await;

        if attempt == 0 {
            // Connection setup dominates the first round trip.
            debug!(url = %url, ok = outcome.is_ok(), "reach: warm-up probe discarded");
        } else {
            match outcome {
                Ok(sample) => {
                    debug!(url = %url, attempt, latency_ms = sample.latency_ms, height = sample.height, "reach: probe ok");
                    tally.record_success(sample);
                    if let Some(on_success) = &ctx.callbacks.on_node_success {
                        on_success(&RpcLatency::new(url.as_str(), sample.latency_ms, sample.height));
                    }
                }
                Err(e) => {
                    debug!(url = %url, attempt, error = %e, "reach: probe failed");
                    tally.record_failure();
                    if let Some(on_failure) = &ctx.callbacks.on_node_failure {
                        on_failure(&url, &e);
                    }
                }
            }
        }

        attempt = attempt.saturating_add(1);
        let more = attempts.is_none_or(|total| attempt < total);
        if more && !ctx.config.delay.is_zero() {
            tokio::time::sleep(ctx.config.delay).await;
        }
    }

    tally.finish()
}
