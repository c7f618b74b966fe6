//! # Runner configuration.
//!
//! Provides [`RunnerConfig`], the settings shared by every run a
//! [`Runner`](crate::Runner) starts.
//!
//! ## Sentinel values
//! - `grace = 0s` → unbounded wait after a termination signal
//! - `bus_capacity = 0` → clamped to 1 by the bus

use std::time::Duration;

use crate::config::ConfigOptions;

/// Settings of a [`Runner`](crate::Runner).
///
/// ## Field semantics
/// - `grace`: how long `*_and_exit` helpers wait for runs after a signal (`0s` = forever)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `config`: layered configuration resolved for every run's context
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Maximum wait for runs to exit once a termination signal arrived.
    ///
    /// When exceeded, `*_and_exit` helpers publish `GraceExceeded` and exit with
    /// [`EXIT_GRACE_EXCEEDED`](crate::EXIT_GRACE_EXCEEDED).
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers lagging behind by more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,

    /// How each run's configuration is resolved.
    pub config: ConfigOptions,
}

impl RunnerConfig {
    /// Grace period as an `Option` (`None` = unbounded).
    #[inline]
    pub fn grace_limit(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Sets the grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Sets the configuration options.
    pub fn with_config(mut self, config: ConfigOptions) -> Self {
        self.config = config;
        self
    }
}

impl Default for RunnerConfig {
    /// - `grace = 0s` (unbounded)
    /// - `bus_capacity = 1024`
    /// - `config = ConfigOptions::default()`
    fn default() -> Self {
        Self {
            grace: Duration::ZERO,
            bus_capacity: 1024,
            config: ConfigOptions::default(),
        }
    }
}
