//! Observability attachments of a service run.
//!
//! ## Contents
//! - [`Logger`] `tracing` span carrying the run identity, with level helpers
//! - [`Tracer`] span factory rooted at the run
//! - [`Meter`] per-run prometheus registry
//! - [`TelemetryProvider`], [`DefaultTelemetry`] how the runtime obtains the three above
//! - [`LogOptions`], [`init_logging`] process-wide subscriber setup from the environment

mod logger;
mod logging;
mod meter;
mod provider;
mod tracer;

pub use logger::Logger;
pub use logging::{LogFormat, LogOptions, LoggingError, init_logging};
pub use meter::Meter;
pub use provider::{DefaultTelemetry, TelemetryProvider};
pub use tracer::Tracer;
