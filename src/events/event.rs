//! # Lifecycle events emitted by the runner and service lifecycles.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Lifecycle events**: one service run (phase changes, failures, exit)
//! - **Shutdown events**: shutdown requests, group cancellation, OS signals, grace outcome
//! - **Subscriber events**: delivery problems inside the [`SubscriberSet`](crate::SubscriberSet)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, service
//! name, run id, phase and reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use servicevisor::{Event, EventKind, Phase};
//!
//! let ev = Event::new(EventKind::PhaseChanged)
//!     .with_service("example")
//!     .with_phase(Phase::Running);
//!
//! assert_eq!(ev.kind, EventKind::PhaseChanged);
//! assert_eq!(ev.service.as_deref(), Some("example"));
//! assert_eq!(ev.phase, Some(Phase::Running));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::Phase;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `service`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `service`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Service lifecycle events ===
    /// A run moved to a new phase.
    ///
    /// Sets:
    /// - `service`, `run_id`
    /// - `phase`: the phase just entered
    PhaseChanged,

    /// The execution context could not be built; the service was never invoked.
    ///
    /// Sets:
    /// - `service`, `run_id`
    /// - `reason`: construction failure
    ContextFailed,

    /// `initialize` or `run` failed (error or panic).
    ///
    /// Sets:
    /// - `service`, `run_id`
    /// - `phase`: phase the failure happened in
    /// - `reason`: failure message
    ServiceFailed,

    /// The shutdown callback failed (error or panic).
    ///
    /// Sets:
    /// - `service`, `run_id`
    /// - `reason`: failure message
    ShutdownFailed,

    /// A run reached a terminal phase and closed its exit signal.
    ///
    /// Sets:
    /// - `service`, `run_id`
    /// - `phase`: `Finished` or `Failed`
    /// - `reason`: combined error, if any
    ServiceExited,

    // === Shutdown events ===
    /// The shutdown gate of a run was fired.
    ///
    /// Sets:
    /// - `service`, `run_id`
    ShutdownRequested,

    /// First exit in a group cancelled the shared token.
    ///
    /// Sets:
    /// - `service`, `run_id`: the run whose exit triggered it
    GroupCancelled,

    /// OS termination signal observed by an `*_and_exit` helper.
    SignalReceived,

    /// All runs stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some runs did not stop in time.
    ///
    /// Sets:
    /// - `reason`: stuck run ids
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Service (or subscriber) name, if applicable.
    pub service: Option<Arc<str>>,
    /// Run id, if applicable.
    pub run_id: Option<Arc<str>>,
    /// Lifecycle phase, if applicable.
    pub phase: Option<Phase>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            run_id: None,
            phase: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches a run id.
    #[inline]
    pub fn with_run_id(mut self, run_id: impl Into<Arc<str>>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Attaches a phase.
    #[inline]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_service(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::SignalReceived);
        let b = Event::new(EventKind::SignalReceived);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_subscriber_helpers() {
        let ev = Event::subscriber_overflow("log", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.service.as_deref(), Some("log"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=log reason=full"));
        assert!(Event::subscriber_panicked("log", "boom".into()).is_subscriber_panic());
    }
}
