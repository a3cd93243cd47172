//! `BrokerConfig` and its fluent builder (SPEC_FULL.md §9c), grounded in the
//! teacher's `system::config::SystemConfig` + `system::builder::ActorSpawnBuilder`
//! pair.

// Layer 1: Standard library imports
use std::time::Duration;

/// Operation tunables shared by every poll task and the subscription
/// builder. Distinct from the per-subscriber policy records in
/// `crate::policy`: those are declarative, per-subscriber; this is
/// process-wide.
#[derive(Debug, Clone, Copy)]
pub struct BrokerConfig {
    operation_timeout: Duration,
    poll_sleep_interval: Duration,
}

impl BrokerConfig {
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    pub fn poll_sleep_interval(&self) -> Duration {
        self.poll_sleep_interval
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(10),
            poll_sleep_interval: Duration::from_millis(500),
        }
    }
}

/// Fluent builder over `BrokerConfig`, mirroring the teacher's
/// `ActorSpawnBuilder`.
#[derive(Debug, Clone, Default)]
pub struct BrokerConfigBuilder {
    config: BrokerConfig,
}

impl BrokerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.operation_timeout = timeout;
        self
    }

    pub fn poll_sleep_interval(mut self, interval: Duration) -> Self {
        self.config.poll_sleep_interval = interval;
        self
    }

    pub fn build(self) -> BrokerConfig {
        self.config
    }
}
