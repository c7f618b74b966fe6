//! # LogWriter: lifecycle events as `tracing` records.
//!
//! A subscriber that renders every [`Event`] through `tracing`, at a level
//! matching its severity. Installed by default by [`Runner::new`](crate::Runner::new).
//!
//! ## Example output (text format)
//! ```text
//! INFO  phase changed service="example" run_id="example@1/..." phase=running
//! ERROR service failed service="example" phase=running reason="run failed: boom"
//! WARN  shutdown failed service="example" reason="shutdown failed: test"
//! INFO  service exited service="example" phase=failed
//! INFO  group cancelled service="example"
//! WARN  grace exceeded reason="stuck: [..]"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let service = e.service.as_deref().unwrap_or("");
        let run_id = e.run_id.as_deref().unwrap_or("");
        let phase = e.phase.map(|p| p.as_str()).unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::PhaseChanged => {
                tracing::info!(seq = e.seq, service, run_id, phase, "phase changed");
            }
            EventKind::ContextFailed => {
                tracing::error!(seq = e.seq, service, run_id, reason, "context construction failed");
            }
            EventKind::ServiceFailed => {
                tracing::error!(seq = e.seq, service, run_id, phase, reason, "service failed");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(seq = e.seq, service, run_id, "shutdown requested");
            }
            EventKind::ShutdownFailed => {
                tracing::warn!(seq = e.seq, service, run_id, reason, "shutdown failed");
            }
            EventKind::ServiceExited => {
                tracing::info!(seq = e.seq, service, run_id, phase, reason, "service exited");
            }
            EventKind::GroupCancelled => {
                tracing::info!(seq = e.seq, service, run_id, "group cancelled");
            }
            EventKind::SignalReceived => {
                tracing::warn!(seq = e.seq, "termination signal received");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(seq = e.seq, "all services stopped within grace");
            }
            EventKind::GraceExceeded => {
                tracing::warn!(seq = e.seq, reason, "grace exceeded");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(seq = e.seq, subscriber = service, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(seq = e.seq, subscriber = service, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
