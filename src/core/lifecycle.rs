//! # Lifecycle: drives one service run from `Waiting` to a terminal phase.
//!
//! ## Flow
//! ```text
//! Waiting
//!   └─► Initializing ── initialize(ctx) ──┬─ Ok ──► Running ── run(ctx) ──┐
//!                                         └─ Err/panic ──────────────────┤ (record run error)
//!                                                                        ▼
//!                                  ShuttingDown ── fire gate, await callback
//!                                                                        ▼
//!                                  Finished | Failed ── close exit signal
//!                                                                        ▼
//!                                  group? first exit ──► cancel group token (once)
//! ```
//!
//! ## Rules
//! - Steps are strictly sequential within one run
//! - Shutdown runs regardless of how initialize/run ended
//! - Panics in `initialize`/`run` are caught and recorded as the run error
//! - The group token is cancelled only after the exit signal closed

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::context::ServiceContext;
use crate::core::{Handle, Phase};
use crate::error::{BoxError, ServiceError};
use crate::events::{Bus, Event, EventKind};

/// Shared cancellation scope of a grouped run.
pub(crate) struct GroupScope {
    token: CancellationToken,
    first_exit: OnceLock<Arc<str>>,
    bus: Bus,
}

impl GroupScope {
    pub(crate) fn new(token: CancellationToken, bus: Bus) -> Self {
        Self {
            token,
            first_exit: OnceLock::new(),
            bus,
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels the group if `handle` is the first member to exit.
    pub(crate) fn on_exit(&self, handle: &Handle) {
        let run_id = handle.identity().run_id_arc();
        if self.first_exit.set(Arc::clone(&run_id)).is_ok() {
            tracing::debug!(service = %handle, run_id = &*run_id, "first exit in group, cancelling siblings");
            self.bus.publish(
                Event::new(EventKind::GroupCancelled)
                    .with_service(handle.name())
                    .with_run_id(run_id),
            );
            self.token.cancel();
        }
    }
}

/// One service run, ready to be spawned.
pub(crate) struct Lifecycle {
    handle: Handle,
    ctx: ServiceContext,
    group: Option<Arc<GroupScope>>,
}

impl Lifecycle {
    pub(crate) fn new(handle: Handle, ctx: ServiceContext, group: Option<Arc<GroupScope>>) -> Self {
        Self { handle, ctx, group }
    }

    /// Runs the lifecycle to completion.
    pub(crate) async fn run(self) {
        let Self { handle, ctx, group } = self;
        let root = ctx.tracer().root().clone();

        drive(&handle, &ctx).instrument(root).await;

        if let Some(group) = group {
            group.on_exit(&handle);
        }
    }
}

async fn drive(handle: &Handle, ctx: &ServiceContext) {
    let service = Arc::clone(handle.service());
    let tracer = ctx.tracer();

    handle.enter(Phase::Initializing);
    let init = guarded(Phase::Initializing, service.initialize(ctx), |source| {
        ServiceError::Initialize { source }
    })
    .instrument(tracer.phase_span(Phase::Initializing))
    .await;

    let outcome = match init {
        Ok(()) => {
            handle.enter(Phase::Running);
            guarded(Phase::Running, service.run(ctx), |source| ServiceError::Run {
                source,
            })
            .instrument(tracer.phase_span(Phase::Running))
            .await
        }
        Err(err) => Err(err),
    };

    if let Err(err) = outcome {
        let phase = handle.phase();
        tracing::warn!(service = %handle, run_id = handle.run_id(), error = %err, "service failed");
        handle.publish_failure(phase, &err);
        handle.record_error(err);
    }

    handle.enter(Phase::ShuttingDown);
    handle.fire_shutdown();
    handle.shutdown_finished().await;
    handle.finish();
}

/// Awaits a lifecycle callback, mapping its error and catching panics.
async fn guarded<F>(
    phase: Phase,
    fut: F,
    wrap: impl FnOnce(BoxError) -> ServiceError,
) -> Result<(), ServiceError>
where
    F: Future<Output = Result<(), BoxError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(wrap(source)),
        Err(payload) => Err(ServiceError::panicked(phase, payload)),
    }
}
