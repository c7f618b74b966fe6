//! # Per-run tracer.
//!
//! ```text
//! service.run {service.name, run_id}        (root, one per run)
//!   ├─ phase {phase="initializing"}
//!   ├─ phase {phase="running"}
//!   │    └─ operation {otel.name="poll"}      (Tracer::span, user code)
//!   └─ phase {phase="shutting_down"}
//! ```

use tracing::Span;

use crate::context::ServiceIdentity;
use crate::core::Phase;

/// Span factory rooted at one service run.
#[derive(Debug, Clone)]
pub struct Tracer {
    root: Span,
}

impl Tracer {
    /// Tracer whose root span carries `id`.
    pub fn for_identity(id: &ServiceIdentity) -> Self {
        let root = tracing::info_span!(
            "service.run",
            service.name = %id.name(),
            service.namespace = %id.namespace(),
            service.version = %id.version(),
            run_id = %id.run_id(),
        );
        Self { root }
    }

    /// Tracer over an existing root span.
    pub fn from_span(root: Span) -> Self {
        Self { root }
    }

    /// Root span of the run.
    pub fn root(&self) -> &Span {
        &self.root
    }

    /// Child span for a named operation.
    pub fn span(&self, operation: &str) -> Span {
        tracing::info_span!(parent: &self.root, "operation", otel.name = operation)
    }

    /// Child span covering one lifecycle phase.
    pub(crate) fn phase_span(&self, phase: Phase) -> Span {
        tracing::info_span!(parent: &self.root, "phase", phase = phase.as_str())
    }
}
