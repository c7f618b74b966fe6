//! # Handle: control and observation of one service run.
//!
//! A [`Handle`] is created by the [`Runner`](crate::Runner) before any lifecycle
//! callback runs and shared (cheap `Arc` clone) between the lifecycle task and
//! any number of observers.
//!
//! ## Shutdown gate
//! ```text
//! shutdown() ─┐                           ┌─► service.shutdown(ctx)  (own task, once)
//! shutdown() ─┼─► gate.take() ── winner ──┤        └─► record error, done.cancel()
//! lifecycle  ─┘        └─ losers          └─► run token cancelled
//!
//! every caller ──► exited.cancelled().await ──► wait() result
//! ```
//!
//! ## Rules
//! - Phase only moves forward; `Finished`/`Failed` are final
//! - Run error and shutdown error are write-once
//! - The exit signal closes exactly once, after both errors are recorded
//! - Dropping a `shutdown()` future never aborts the callback nor re-arms the gate

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::SystemTime;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::context::{ServiceContext, ServiceIdentity};
use crate::core::phase::PhaseCell;
use crate::core::Phase;
use crate::error::{RunError, ServiceError};
use crate::events::{Bus, Event, EventKind};
use crate::service::{Health, ServiceRef};

/// Process-wide exit counter; orders exits across handles.
static EXIT_SEQ: AtomicU64 = AtomicU64::new(0);

struct Inner {
    identity: Arc<ServiceIdentity>,
    service: ServiceRef,
    phase: PhaseCell,
    error: OnceLock<Arc<ServiceError>>,
    shutdown_error: OnceLock<Arc<ServiceError>>,
    exit_seq: OnceLock<u64>,
    exited: CancellationToken,
    /// Run token; cancelled when shutdown is requested.
    token: CancellationToken,
    /// Holds the context until the shutdown callback is claimed.
    gate: Mutex<Option<ServiceContext>>,
    shutdown_done: CancellationToken,
    bus: Bus,
}

/// Control and observation object for one service run.
#[derive(Clone)]
pub struct Handle {
    inner: Arc<Inner>,
}

impl Handle {
    /// Handle for a run whose context was built; phase `Waiting`.
    pub(crate) fn new(service: ServiceRef, ctx: ServiceContext, bus: Bus) -> Self {
        let inner = Inner {
            identity: ctx.identity_arc(),
            service,
            phase: PhaseCell::new(Phase::Waiting),
            error: OnceLock::new(),
            shutdown_error: OnceLock::new(),
            exit_seq: OnceLock::new(),
            exited: CancellationToken::new(),
            token: ctx.token().clone(),
            gate: Mutex::new(Some(ctx)),
            shutdown_done: CancellationToken::new(),
            bus,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Already terminated handle for a run whose context could not be built.
    ///
    /// The gate is empty, so the service is never invoked.
    pub(crate) fn failed(
        service: ServiceRef,
        identity: Arc<ServiceIdentity>,
        token: CancellationToken,
        err: ServiceError,
        bus: Bus,
    ) -> Self {
        let inner = Inner {
            identity,
            service,
            phase: PhaseCell::new(Phase::Waiting),
            error: OnceLock::new(),
            shutdown_error: OnceLock::new(),
            exit_seq: OnceLock::new(),
            exited: CancellationToken::new(),
            token,
            gate: Mutex::new(None),
            shutdown_done: CancellationToken::new(),
            bus,
        };
        let handle = Self {
            inner: Arc::new(inner),
        };
        handle.inner.shutdown_done.cancel();
        handle.publish(Event::new(EventKind::ContextFailed).with_reason(err.to_string()));
        handle.record_error(err);
        handle.finish();
        handle
    }

    /// Latest committed phase.
    pub fn phase(&self) -> Phase {
        self.inner.phase.get()
    }

    /// Error that terminated the main execution, if any.
    pub fn error(&self) -> Option<Arc<ServiceError>> {
        self.inner.error.get().cloned()
    }

    /// Error returned by the shutdown callback, if any.
    pub fn shutdown_error(&self) -> Option<Arc<ServiceError>> {
        self.inner.shutdown_error.get().cloned()
    }

    /// True once the exit signal closed.
    pub fn is_terminated(&self) -> bool {
        self.inner.exited.is_cancelled()
    }

    /// Process-wide exit sequence number, once terminated.
    pub fn exit_seq(&self) -> Option<u64> {
        self.inner.exit_seq.get().copied()
    }

    /// Waits until the run has fully exited.
    ///
    /// Returns the run error with the shutdown error associated. Any number of
    /// callers get the same result; calling it has no side effects.
    pub async fn wait(&self) -> Result<(), RunError> {
        self.inner.exited.cancelled().await;
        self.result()
    }

    /// Requests graceful termination and waits for the run to exit.
    ///
    /// Cancels the run's token and fires the service's shutdown callback; the
    /// callback runs at most once per run no matter how many callers race here.
    pub async fn shutdown(&self) -> Result<(), RunError> {
        self.fire_shutdown();
        self.wait().await
    }

    /// Health reported by the service.
    pub fn health(&self) -> Health {
        self.inner.service.health()
    }

    /// Identity of the run.
    pub fn identity(&self) -> &ServiceIdentity {
        &self.inner.identity
    }

    pub fn name(&self) -> &str {
        self.inner.identity.name()
    }

    pub fn namespace(&self) -> &str {
        self.inner.identity.namespace()
    }

    pub fn version(&self) -> &str {
        self.inner.identity.version()
    }

    pub fn run_id(&self) -> &str {
        self.inner.identity.run_id()
    }

    pub fn started_at(&self) -> SystemTime {
        self.inner.identity.started_at()
    }

    pub(crate) fn service(&self) -> &ServiceRef {
        &self.inner.service
    }

    /// Result of a terminated run (does not wait).
    pub(crate) fn result(&self) -> Result<(), RunError> {
        match RunError::combine(self.error(), self.shutdown_error()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Commits `phase` and publishes the change.
    pub(crate) fn enter(&self, phase: Phase) {
        if self.inner.phase.advance(phase) {
            tracing::debug!(
                service = %self.inner.identity,
                run_id = self.run_id(),
                phase = phase.as_str(),
                "phase changed"
            );
            self.publish(Event::new(EventKind::PhaseChanged).with_phase(phase));
        }
    }

    /// Records the run error; later errors are dropped.
    pub(crate) fn record_error(&self, err: ServiceError) {
        let _ = self.inner.error.set(Arc::new(err));
    }

    /// Publishes `ServiceFailed` for an initialize/run failure.
    pub(crate) fn publish_failure(&self, phase: Phase, err: &ServiceError) {
        self.publish(
            Event::new(EventKind::ServiceFailed)
                .with_phase(phase)
                .with_reason(err.to_string()),
        );
    }

    /// Claims the shutdown gate. The winner spawns the callback on its own task.
    pub(crate) fn fire_shutdown(&self) {
        let claimed = match self.inner.gate.lock() {
            Ok(mut gate) => gate.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(ctx) = claimed else {
            return;
        };

        self.inner.token.cancel();
        self.publish(Event::new(EventKind::ShutdownRequested));

        let inner = Arc::clone(&self.inner);
        let span = ctx.tracer().phase_span(Phase::ShuttingDown);
        tokio::spawn(async move {
            let res = AssertUnwindSafe(inner.service.shutdown(&ctx))
                .catch_unwind()
                .instrument(span)
                .await;
            let err = match res {
                Ok(Ok(())) => None,
                Ok(Err(source)) => Some(ServiceError::Shutdown { source }),
                Err(payload) => Some(ServiceError::panicked(Phase::ShuttingDown, payload)),
            };
            if let Some(err) = err {
                inner.bus.publish(
                    Event::new(EventKind::ShutdownFailed)
                        .with_service(inner.identity.name())
                        .with_run_id(inner.identity.run_id_arc())
                        .with_reason(err.to_string()),
                );
                let _ = inner.shutdown_error.set(Arc::new(err));
            }
            inner.shutdown_done.cancel();
        });
    }

    /// Waits until the shutdown callback finished, whoever fired it.
    pub(crate) async fn shutdown_finished(&self) {
        self.inner.shutdown_done.cancelled().await;
    }

    /// Terminal transition: phase, exit sequence, exit signal. Runs once.
    pub(crate) fn finish(&self) {
        if self.inner.exit_seq.get().is_some() {
            return;
        }
        let terminal = if self.inner.error.get().is_some() || self.inner.shutdown_error.get().is_some()
        {
            Phase::Failed
        } else {
            Phase::Finished
        };
        self.enter(terminal);
        let _ = self
            .inner
            .exit_seq
            .set(EXIT_SEQ.fetch_add(1, Ordering::SeqCst));

        let mut ev = Event::new(EventKind::ServiceExited).with_phase(terminal);
        if let Err(err) = self.result() {
            ev = ev.with_reason(err.to_string());
        }
        self.publish(ev);
        self.inner.exited.cancel();
    }

    fn publish(&self, ev: Event) {
        self.inner.bus.publish(
            ev.with_service(self.inner.identity.name())
                .with_run_id(self.inner.identity.run_id_arc()),
        );
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner.identity, f)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("run_id", &self.run_id())
            .field("phase", &self.phase())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
