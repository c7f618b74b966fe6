//! # Lifecycle phase of one service run.
//!
//! ```text
//! Waiting ─► Initializing ─► Running ─► ShuttingDown ─┬─► Finished
//!                                                    └─► Failed
//! ```
//!
//! ## Rules
//! - A run's phase only moves forward along this order
//! - `Finished` and `Failed` are terminal and mutually exclusive
//! - Transitions are commanded by the lifecycle driver only

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle phase of a service run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Handle created, nothing invoked yet.
    Waiting,
    /// `Service::initialize` in progress.
    Initializing,
    /// `Service::run` in progress.
    Running,
    /// Shutdown callback in progress.
    ShuttingDown,
    /// Terminated cleanly.
    Finished,
    /// Terminated with a run or shutdown error.
    Failed,
}

impl Phase {
    /// Stable lowercase name, used in logs and events.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Waiting => "waiting",
            Phase::Initializing => "initializing",
            Phase::Running => "running",
            Phase::ShuttingDown => "shutting_down",
            Phase::Finished => "finished",
            Phase::Failed => "failed",
        }
    }

    /// True for `Finished` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Finished | Phase::Failed)
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Phase::Waiting,
            1 => Phase::Initializing,
            2 => Phase::Running,
            3 => Phase::ShuttingDown,
            4 => Phase::Finished,
            _ => Phase::Failed,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic phase storage shared between the lifecycle driver and observers.
#[derive(Debug)]
pub(crate) struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub(crate) fn new(phase: Phase) -> Self {
        Self(AtomicU8::new(phase as u8))
    }

    pub(crate) fn get(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Commits a transition. Backward moves are ignored.
    pub(crate) fn advance(&self, next: Phase) -> bool {
        let prev = Phase::from_u8(self.0.load(Ordering::SeqCst));
        if prev.is_terminal() || next <= prev {
            return false;
        }
        self.0.store(next as u8, Ordering::SeqCst);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_follows_lifecycle() {
        assert!(Phase::Waiting < Phase::Initializing);
        assert!(Phase::Initializing < Phase::Running);
        assert!(Phase::Running < Phase::ShuttingDown);
        assert!(Phase::ShuttingDown < Phase::Finished);
        assert!(Phase::ShuttingDown < Phase::Failed);
    }

    #[test]
    fn test_cell_is_monotonic() {
        let cell = PhaseCell::new(Phase::Waiting);
        assert!(cell.advance(Phase::Running));
        assert!(!cell.advance(Phase::Initializing));
        assert_eq!(cell.get(), Phase::Running);
        assert!(cell.advance(Phase::Finished));
        assert!(!cell.advance(Phase::Failed));
        assert_eq!(cell.get(), Phase::Finished);
    }

    #[test]
    fn test_failed_is_terminal_from_shutting_down() {
        let cell = PhaseCell::new(Phase::ShuttingDown);
        assert!(cell.advance(Phase::Failed));
        assert!(cell.get().is_terminal());
        assert_eq!(cell.get().to_string(), "failed");
    }
}
