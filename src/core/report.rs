//! # Outcome of waiting on a set of runs.
//!
//! [`RunReport`] keeps every handle's result in launch order and knows the
//! order in which the runs exited. Aggregation visits results in exit order,
//! so the first run to fail supplies the primary error.

use std::sync::Arc;

use futures::future::join_all;

use crate::context::ServiceIdentity;
use crate::core::{Handle, Phase};
use crate::error::RunError;

/// Result of one terminated run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Identity of the run.
    pub identity: Arc<ServiceIdentity>,
    /// Terminal phase.
    pub phase: Phase,
    /// Process-wide exit sequence number.
    pub exit_seq: u64,
    /// What `Handle::wait` returned.
    pub result: Result<(), RunError>,
}

/// Results of a set of runs, in launch order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    outcomes: Vec<RunOutcome>,
}

impl RunReport {
    /// Waits for every handle and collects the results.
    pub async fn collect(handles: &[Handle]) -> Self {
        let results = join_all(handles.iter().map(Handle::wait)).await;
        let outcomes = handles
            .iter()
            .zip(results)
            .map(|(h, result)| RunOutcome {
                identity: Arc::new(h.identity().clone()),
                phase: h.phase(),
                exit_seq: h.exit_seq().unwrap_or(u64::MAX),
                result,
            })
            .collect();
        Self { outcomes }
    }

    /// Outcomes in launch order.
    pub fn outcomes(&self) -> &[RunOutcome] {
        &self.outcomes
    }

    /// Outcomes in the order the runs exited.
    pub fn exit_order(&self) -> Vec<&RunOutcome> {
        let mut ordered: Vec<&RunOutcome> = self.outcomes.iter().collect();
        ordered.sort_by_key(|o| o.exit_seq);
        ordered
    }

    /// True if every run succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Aggregates all results, visiting them in exit order.
    pub fn into_result(self) -> Result<(), RunError> {
        RunError::aggregate(self.exit_order().into_iter().map(|o| &o.result))
    }

    /// Process exit code: 0 on success, otherwise the most severe error's code.
    pub fn exit_code(&self) -> i32 {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err())
            .map(RunError::exit_code)
            .max()
            .unwrap_or(0)
    }
}
