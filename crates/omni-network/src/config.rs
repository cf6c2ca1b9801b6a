//! Configuration for reachability runs.

use std::collections::HashMap;
use std::time::Duration;

use config::{Config, Environment};
use omni_core::constants::{
    DEFAULT_MAX_CONCURRENCY, DEFAULT_REACH_COUNT, DEFAULT_REACH_DELAY_MS, DEFAULT_REACH_TIMEOUT_MS,
};
use omni_core::error::ReachError;
use serde::Deserialize;

/// Prefix of the environment variables read by [`ReachConfig::from_env`].
pub const ENV_PREFIX: &str = "OMNI_REACH";

/// Settings for one reachability run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachConfig {
    /// Probes per URL that count, on top of the discarded warm-up probe.
    /// Zero keeps probing until the run is stopped.
    pub reach_count: u32,
    /// Timeout handed to every probe.
    pub timeout: Duration,
    /// Pause between consecutive probes of the same URL.
    pub delay: Duration,
    /// Maximum number of endpoints probed at once.
    pub max_concurrency: usize,
}

impl Default for ReachConfig {
    fn default() -> Self {
        Self {
            reach_count: DEFAULT_REACH_COUNT,
            timeout: Duration::from_millis(DEFAULT_REACH_TIMEOUT_MS),
            delay: Duration::from_millis(DEFAULT_REACH_DELAY_MS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Overrides {
    reach_count: Option<u32>,
    timeout_ms: Option<u64>,
    delay_ms: Option<u64>,
    max_concurrency: Option<usize>,
}

impl ReachConfig {
    /// One counted probe, short timeout, no pause.
    pub fn quick() -> Self {
        Self {
            reach_count: 1,
            timeout: Duration::from_secs(5),
            delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Probe until stopped.
    pub fn continuous() -> Self {
        Self {
            reach_count: 0,
            ..Self::default()
        }
    }

    pub fn is_continuous(&self) -> bool {
        self.reach_count == 0
    }

    /// Total probes per URL including the warm-up, or `None` when continuous.
    pub fn attempts(&self) -> Option<u32> {
        if self.is_continuous() {
            None
        } else {
            Some(self.reach_count.saturating_add(1))
        }
    }

    /// Defaults overridden by `OMNI_REACH_REACH_COUNT`, `OMNI_REACH_TIMEOUT_MS`,
    /// `OMNI_REACH_DELAY_MS` and `OMNI_REACH_MAX_CONCURRENCY`.
    pub fn from_env() -> Result<Self, ReachError> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Like [`from_env`](Self::from_env) but reads `vars` instead of the
    /// process environment.
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self, ReachError> {
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(env: Environment) -> Result<Self, ReachError> {
        let overrides: Overrides = Config::builder()
            .add_source(env.try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ReachError::Config(e.to_string()))?;

        let defaults = Self::default();
        Ok(Self {
            reach_count: overrides.reach_count.unwrap_or(defaults.reach_count),
            timeout: overrides
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            delay: overrides
                .delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.delay),
            max_concurrency: overrides
                .max_concurrency
                .unwrap_or(defaults.max_concurrency)
                .max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ReachConfig::default();
        assert_eq!(cfg.reach_count, 1);
        assert_eq!(cfg.timeout, Duration::from_millis(20_000));
        assert_eq!(cfg.delay, Duration::from_millis(1_500));
        assert_eq!(cfg.max_concurrency, DEFAULT_MAX_CONCURRENCY);
    }

    #[test]
    fn attempts_include_warm_up() {
        assert_eq!(ReachConfig::default().attempts(), Some(2));
        let cfg = ReachConfig { reach_count: 3, ..ReachConfig::default() };
        assert_eq!(cfg.attempts(), Some(4));
    }

    #[test]
    fn continuous_has_no_attempt_bound() {
        let cfg = ReachConfig::continuous();
        assert!(cfg.is_continuous());
        assert_eq!(cfg.attempts(), None);
    }

    #[test]
    fn quick_has_no_delay() {
        let cfg = ReachConfig::quick();
        assert_eq!(cfg.delay, Duration::ZERO);
        assert_eq!(cfg.timeout, Duration::from_secs(5));
    }

    #[test]
    fn empty_env_gives_defaults() {
        let cfg = ReachConfig::from_env_map(HashMap::new()).unwrap();
        assert_eq!(cfg, ReachConfig::default());
    }

    #[test]
    fn env_overrides_apply() {
        let cfg = ReachConfig::from_env_map(vars(&[
            ("OMNI_REACH_REACH_COUNT", "3"),
            ("OMNI_REACH_TIMEOUT_MS", "750"),
            ("OMNI_REACH_DELAY_MS", "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.reach_count, 3);
        assert_eq!(cfg.timeout, Duration::from_millis(750));
        assert_eq!(cfg.delay, Duration::ZERO);
        assert_eq!(cfg.max_concurrency, DEFAULT_MAX_CONCURRENCY);
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let cfg = ReachConfig::from_env_map(vars(&[("OMNI_REACH_MAX_CONCURRENCY", "0")])).unwrap();
        assert_eq!(cfg.max_concurrency, 1);
    }

    #[test]
    fn malformed_value_is_config_error() {
        let err = ReachConfig::from_env_map(vars(&[("OMNI_REACH_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ReachError::Config(_)));
    }
}
