//! # Per-run logger.
//!
//! A [`Logger`] is a `tracing` span carrying the run identity. Every record
//! emitted through it is nested in that span, so the fmt/JSON subscriber prints
//! the service fields next to the message.

use std::fmt;

use tracing::Span;

use crate::context::ServiceIdentity;

/// Logger bound to one service run.
#[derive(Debug, Clone)]
pub struct Logger {
    span: Span,
}

impl Logger {
    /// Logger whose span carries `id`.
    pub fn for_identity(id: &ServiceIdentity) -> Self {
        let span = tracing::info_span!(
            "service",
            service.name = %id.name(),
            service.namespace = %id.namespace(),
            service.version = %id.version(),
            run_id = %id.run_id(),
        );
        Self { span }
    }

    /// Logger over an existing span.
    pub fn from_span(span: Span) -> Self {
        Self { span }
    }

    /// The span records are nested in.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Emits a debug record.
    pub fn debug(&self, msg: impl fmt::Display) {
        self.span.in_scope(|| tracing::debug!("{msg}"));
    }

    /// Emits an info record.
    pub fn info(&self, msg: impl fmt::Display) {
        self.span.in_scope(|| tracing::info!("{msg}"));
    }

    /// Emits a warning record.
    pub fn warn(&self, msg: impl fmt::Display) {
        self.span.in_scope(|| tracing::warn!("{msg}"));
    }

    /// Emits an error record.
    pub fn error(&self, msg: impl fmt::Display) {
        self.span.in_scope(|| tracing::error!("{msg}"));
    }
}
