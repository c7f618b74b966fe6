//! # Telemetry provider: builds the observability attachments of a run.
//!
//! The runtime asks the provider for a [`Logger`], a [`Tracer`] and a [`Meter`]
//! keyed by the run's [`ServiceIdentity`]. Any failure aborts context
//! construction and the service is never invoked.
//!
//! Every method has a default implementation, so a custom provider only
//! overrides what it needs:
//!
//! ```rust
//! use servicevisor::{ContextError, Meter, ServiceIdentity, TelemetryProvider};
//!
//! /// Shares one registry between all runs.
//! struct SharedRegistry(prometheus::Registry);
//!
//! impl TelemetryProvider for SharedRegistry {
//!     fn meter(&self, _id: &ServiceIdentity) -> Result<Meter, ContextError> {
//!         Ok(Meter::from_registry(self.0.clone()))
//!     }
//! }
//! ```

use crate::context::ServiceIdentity;
use crate::error::ContextError;

use super::{Logger, Meter, Tracer};

/// Source of per-run logger, tracer and meter.
pub trait TelemetryProvider: Send + Sync + 'static {
    /// Logger for the run.
    fn logger(&self, id: &ServiceIdentity) -> Result<Logger, ContextError> {
        Ok(Logger::for_identity(id))
    }

    /// Tracer for the run.
    fn tracer(&self, id: &ServiceIdentity) -> Result<Tracer, ContextError> {
        Ok(Tracer::for_identity(id))
    }

    /// Meter for the run.
    fn meter(&self, id: &ServiceIdentity) -> Result<Meter, ContextError> {
        Meter::for_identity(id).map_err(|e| ContextError::Telemetry {
            reason: format!("meter: {e}"),
        })
    }
}

/// `tracing` spans for logs and traces, one prometheus registry per run.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTelemetry;

impl TelemetryProvider for DefaultTelemetry {}
