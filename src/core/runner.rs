//! # Runner: drives services through their lifecycle.
//!
//! The [`Runner`] owns the event bus, a [`SubscriberSet`] and a
//! [`ContextFactory`]. Each `run*` call builds one execution context and one
//! [`Handle`] per service, then spawns one lifecycle task per service.
//!
//! ## Policies
//! ```text
//! run_parallel(base, [A, B])           run_group(base, [A, B])
//!
//!   base ─┬─ child ─► A                  base ── group ─┬─ child ─► A
//!         └─ child ─► B                                 └─ child ─► B
//!
//!   A fails: B keeps running            first exit (A or B, ok or not):
//!                                         group.cancel() ─► every child cancelled
//! ```
//!
//! ## Entry points
//! - `run*` → `Handle`s, returns once every lifecycle is spawned
//! - `run*_and_wait` → [`RunReport`] once every run exited
//! - `run*_and_exit` → listen for OS signals, cancel on signal, wait (bounded by
//!   [`RunnerConfig::grace`]), flush subscribers, exit the process
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use servicevisor::{BoxError, Runner, Service, ServiceContext};
//!
//! struct Worker;
//!
//! #[async_trait]
//! impl Service for Worker {
//!     fn name(&self) -> &str { "worker" }
//!     fn version(&self) -> &str { "1.0.0" }
//!     async fn initialize(&self, _ctx: &ServiceContext) -> Result<(), BoxError> { Ok(()) }
//!     async fn run(&self, ctx: &ServiceContext) -> Result<(), BoxError> {
//!         ctx.cancelled().await;
//!         Ok(())
//!     }
//!     async fn shutdown(&self, _ctx: &ServiceContext) -> Result<(), BoxError> { Ok(()) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     Runner::new().run_group_and_exit(vec![Arc::new(Worker)]).await
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::context::{ContextFactory, ServiceIdentity};
use crate::core::lifecycle::{GroupScope, Lifecycle};
use crate::core::{Handle, RunReport, RunnerBuilder, RunnerConfig, shutdown};
use crate::error::{RuntimeError, ServiceError};
use crate::events::{Bus, Event, EventKind};
use crate::service::ServiceRef;
use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};

/// Orchestrates service lifecycles, event delivery and process exit.
pub struct Runner {
    cfg: RunnerConfig,
    bus: Bus,
    factory: ContextFactory,
    subs: Option<Arc<SubscriberSet>>,
    listener: Option<JoinHandle<()>>,
    stop: CancellationToken,
}

impl Runner {
    /// Starts a builder with the given configuration.
    pub fn builder(cfg: RunnerConfig) -> RunnerBuilder {
        RunnerBuilder::new(cfg)
    }

    /// Runner with default configuration and a [`LogWriter`] subscriber.
    ///
    /// # Panics
    /// Spawns the event listener, so it panics outside a tokio runtime.
    pub fn new() -> Self {
        RunnerBuilder::new(RunnerConfig::default())
            .with_subscriber(Arc::new(LogWriter::new()))
            .build()
    }

    pub(crate) fn new_internal(
        cfg: RunnerConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
        factory: ContextFactory,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));
        let stop = CancellationToken::new();
        let listener = subscriber_listener(&bus, Arc::clone(&subs), stop.clone());

        Self {
            cfg,
            bus,
            factory,
            subs: Some(subs),
            listener: Some(listener),
            stop,
        }
    }

    /// Runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.cfg
    }

    /// Event bus; [`Bus::subscribe`] opens an extra receiver.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Starts one service on a child token of `base`.
    pub fn run(&self, base: &CancellationToken, service: ServiceRef) -> Handle {
        self.launch(service, base.child_token(), None)
    }

    /// Starts services independently; a failing sibling never cancels the others.
    pub fn run_parallel(&self, base: &CancellationToken, services: Vec<ServiceRef>) -> Vec<Handle> {
        services
            .into_iter()
            .map(|svc| self.launch(svc, base.child_token(), None))
            .collect()
    }

    /// Starts services as a group; the first run to exit cancels all of them.
    ///
    /// A context construction failure counts as an exit.
    pub fn run_group(&self, base: &CancellationToken, services: Vec<ServiceRef>) -> Vec<Handle> {
        let group = Arc::new(GroupScope::new(base.child_token(), self.bus.clone()));
        services
            .into_iter()
            .map(|svc| {
                let token = group.token().child_token();
                self.launch(svc, token, Some(Arc::clone(&group)))
            })
            .collect()
    }

    /// [`run`](Self::run), then wait for the run to exit.
    pub async fn run_and_wait(&self, base: &CancellationToken, service: ServiceRef) -> RunReport {
        let handle = self.run(base, service);
        RunReport::collect(std::slice::from_ref(&handle)).await
    }

    /// [`run_parallel`](Self::run_parallel), then wait for every run to exit.
    pub async fn run_parallel_and_wait(
        &self,
        base: &CancellationToken,
        services: Vec<ServiceRef>,
    ) -> RunReport {
        let handles = self.run_parallel(base, services);
        RunReport::collect(&handles).await
    }

    /// [`run_group`](Self::run_group), then wait for every run to exit.
    pub async fn run_group_and_wait(
        &self,
        base: &CancellationToken,
        services: Vec<ServiceRef>,
    ) -> RunReport {
        let handles = self.run_group(base, services);
        RunReport::collect(&handles).await
    }

    /// Runs one service until it exits or a termination signal arrives, then exits the process.
    pub async fn run_and_exit(self, service: ServiceRef) -> ! {
        let base = CancellationToken::new();
        let handles = vec![self.run(&base, service)];
        self.exit_with(base, handles).await
    }

    /// Parallel variant of [`run_and_exit`](Self::run_and_exit).
    pub async fn run_parallel_and_exit(self, services: Vec<ServiceRef>) -> ! {
        let base = CancellationToken::new();
        let handles = self.run_parallel(&base, services);
        self.exit_with(base, handles).await
    }

    /// Group variant of [`run_and_exit`](Self::run_and_exit).
    pub async fn run_group_and_exit(self, services: Vec<ServiceRef>) -> ! {
        let base = CancellationToken::new();
        let handles = self.run_group(&base, services);
        self.exit_with(base, handles).await
    }

    /// Stops the event listener and waits until subscribers drained their queues.
    pub async fn close(mut self) {
        self.stop.cancel();
        if let Some(listener) = self.listener.take() {
            let _ = listener.await;
        }
        if let Some(subs) = self.subs.take().and_then(Arc::into_inner) {
            subs.shutdown().await;
        }
    }

    async fn exit_with(self, base: CancellationToken, handles: Vec<Handle>) -> ! {
        let code = self
            .settle(&base, &handles, shutdown::shutdown_signal())
            .await;
        self.close().await;
        std::process::exit(code)
    }

    /// Waits for all runs; on `signal`, cancels `base` and waits at most `grace`.
    ///
    /// Returns the process exit code.
    pub(crate) async fn settle<S>(&self, base: &CancellationToken, handles: &[Handle], signal: S) -> i32
    where
        S: Future<Output = &'static str>,
    {
        tokio::select! {
            report = RunReport::collect(handles) => report.exit_code(),
            name = signal => {
                tracing::info!(signal = name, "termination signal received, shutting down");
                self.bus.publish(Event::new(EventKind::SignalReceived).with_reason(name));
                base.cancel();
                self.wait_all_with_grace(handles).await
            }
        }
    }

    /// Waits for all runs within the configured grace period.
    async fn wait_all_with_grace(&self, handles: &[Handle]) -> i32 {
        let Some(grace) = self.cfg.grace_limit() else {
            return RunReport::collect(handles).await.exit_code();
        };

        match tokio::time::timeout(grace, RunReport::collect(handles)).await {
            Ok(report) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                report.exit_code()
            }
            Err(_elapsed) => {
                let stuck: Vec<String> = handles
                    .iter()
                    .filter(|h| !h.is_terminated())
                    .map(|h| h.run_id().to_string())
                    .collect();
                let err = RuntimeError::GraceExceeded { grace, stuck };
                tracing::error!(error = %err, label = err.as_label(), "grace period exceeded");
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_reason(err.to_string()));
                err.exit_code()
            }
        }
    }

    /// Builds the context and handle, then spawns the lifecycle.
    fn launch(
        &self,
        service: ServiceRef,
        token: CancellationToken,
        group: Option<Arc<GroupScope>>,
    ) -> Handle {
        let identity = Arc::new(ServiceIdentity::of(service.as_ref()));

        match self.factory.build(Arc::clone(&identity), token.clone()) {
            Ok(ctx) => {
                let handle = Handle::new(service, ctx.clone(), self.bus.clone());
                tokio::spawn(Lifecycle::new(handle.clone(), ctx, group).run());
                handle
            }
            Err(source) => {
                tracing::error!(service = %identity, error = %source, "failed to build execution context");
                let handle = Handle::failed(
                    service,
                    identity,
                    token,
                    ServiceError::Context { source },
                    self.bus.clone(),
                );
                if let Some(group) = group {
                    group.on_exit(&handle);
                }
                handle
            }
        }
    }
}

/// Same as [`Runner::new`]; panics outside a tokio runtime.
impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// Forwards bus events to the subscriber set until `stop` fires and the bus is drained.
fn subscriber_listener(bus: &Bus, set: Arc<SubscriberSet>, stop: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => break,
            }
        }
    })
}
