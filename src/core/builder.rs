//! # RunnerBuilder: assembles a [`Runner`] with optional features.

use std::sync::Arc;

use crate::context::ContextFactory;
use crate::core::{Runner, RunnerConfig};
use crate::observability::{DefaultTelemetry, TelemetryProvider};
use crate::subscribers::Subscribe;

/// Builder for constructing a [`Runner`].
pub struct RunnerBuilder {
    cfg: RunnerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    telemetry: Arc<dyn TelemetryProvider>,
}

impl RunnerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: RunnerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            telemetry: Arc::new(DefaultTelemetry),
        }
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive lifecycle events (phases, failures, shutdown, ...)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Replaces the telemetry provider used to build each run's logger, tracer and meter.
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetryProvider>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Builds the runner.
    ///
    /// Spawns the event listener, so it must be called inside a tokio runtime.
    pub fn build(self) -> Runner {
        let factory = ContextFactory::new(self.telemetry, self.cfg.config.clone());
        Runner::new_internal(self.cfg, self.subscribers, factory)
    }
}
