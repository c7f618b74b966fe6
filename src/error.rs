//! Error types used by the servicevisor runtime and services.
//!
//! This module defines the main error types:
//!
//! - [`ServiceError`] - a failure at one step of a service lifecycle.
//! - [`RunError`] - the combined result of one (or many) runs: a primary error plus associated errors.
//! - [`ContextError`] - the execution context for a run could not be built.
//! - [`RuntimeError`] - errors raised by the orchestration runtime itself.
//!
//! [`ServiceError`] and [`RuntimeError`] provide helper methods (`as_label`, `exit_code`)
//! for logging/metrics and process exit status.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::core::Phase;

/// Boxed error returned by service callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Exit code used when runs are still alive after the grace period.
pub const EXIT_GRACE_EXCEEDED: i32 = 124;

/// # Errors produced at one step of a service lifecycle.
///
/// Variants are ordered by severity (see [`ServiceError::exit_code`]):
/// `Shutdown` < `Run` < `Initialize` < `Context` < `Panicked`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The execution context could not be built; the service was never invoked.
    #[error("failed to build execution context: {source}")]
    Context {
        /// Underlying construction failure.
        #[source]
        source: ContextError,
    },

    /// `Service::initialize` returned an error; `run` was skipped.
    #[error("initialize failed: {source}")]
    Initialize {
        /// Error returned by the service.
        #[source]
        source: BoxError,
    },

    /// `Service::run` returned an error (including cancellation reported as an error).
    #[error("run failed: {source}")]
    Run {
        /// Error returned by the service.
        #[source]
        source: BoxError,
    },

    /// `Service::shutdown` returned an error.
    #[error("shutdown failed: {source}")]
    Shutdown {
        /// Error returned by the service.
        #[source]
        source: BoxError,
    },

    /// A lifecycle callback panicked.
    #[error("panicked while {phase}: {message}")]
    Panicked {
        /// Phase the service was in when it panicked.
        phase: Phase,
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servicevisor::ServiceError;
    ///
    /// let err = ServiceError::Run { source: "boom".into() };
    /// assert_eq!(err.as_label(), "service_run_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Context { .. } => "service_context_failed",
            ServiceError::Initialize { .. } => "service_initialize_failed",
            ServiceError::Run { .. } => "service_run_failed",
            ServiceError::Shutdown { .. } => "service_shutdown_failed",
            ServiceError::Panicked { .. } => "service_panicked",
        }
    }

    /// Process exit code for this error.
    ///
    /// Codes grow with severity, so the worst error of a multi-service run is
    /// simply the one with the highest code.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceError::Shutdown { .. } => 1,
            ServiceError::Run { .. } => 2,
            ServiceError::Initialize { .. } => 3,
            ServiceError::Context { .. } => 78,
            ServiceError::Panicked { .. } => 101,
        }
    }

    pub(crate) fn panicked(phase: Phase, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        ServiceError::Panicked { phase, message }
    }
}

/// # Combined outcome of a failed run.
///
/// Holds one **primary** error and any number of **associated** errors.
/// Associated errors never replace the primary one: a shutdown failure after a
/// run failure is attached to the run failure, not the other way round.
///
/// Cloning is cheap; every waiter of a handle receives a clone of the same value.
#[derive(Debug, Clone)]
pub struct RunError {
    primary: Arc<ServiceError>,
    associated: Vec<Arc<ServiceError>>,
}

impl RunError {
    /// Creates a run error with no associated errors.
    pub fn new(primary: Arc<ServiceError>) -> Self {
        Self {
            primary,
            associated: Vec::new(),
        }
    }

    /// Attaches an associated error.
    pub fn with_associated(mut self, err: Arc<ServiceError>) -> Self {
        self.associated.push(err);
        self
    }

    /// Combines a primary error with an optional secondary one.
    ///
    /// With no primary, the secondary is promoted to primary; with neither, the run succeeded.
    pub fn combine(
        primary: Option<Arc<ServiceError>>,
        secondary: Option<Arc<ServiceError>>,
    ) -> Option<Self> {
        match (primary, secondary) {
            (Some(p), Some(s)) => Some(Self::new(p).with_associated(s)),
            (Some(p), None) => Some(Self::new(p)),
            (None, Some(s)) => Some(Self::new(s)),
            (None, None) => None,
        }
    }

    /// Aggregates many run results into one.
    ///
    /// Results are visited in the given order; the first failure supplies the primary error,
    /// and every other error (its own associated errors included) becomes associated.
    pub fn aggregate<'a, I>(results: I) -> Result<(), RunError>
    where
        I: IntoIterator<Item = &'a Result<(), RunError>>,
    {
        let mut acc: Option<RunError> = None;
        for err in results.into_iter().filter_map(|r| r.as_ref().err()) {
            match acc.as_mut() {
                None => acc = Some(err.clone()),
                Some(a) => a.associated.extend(err.errors().cloned()),
            }
        }
        match acc {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// The primary error.
    pub fn primary(&self) -> &Arc<ServiceError> {
        &self.primary
    }

    /// Associated (secondary) errors.
    pub fn associated(&self) -> &[Arc<ServiceError>] {
        &self.associated
    }

    /// Primary error followed by all associated errors.
    pub fn errors(&self) -> impl Iterator<Item = &Arc<ServiceError>> {
        std::iter::once(&self.primary).chain(self.associated.iter())
    }

    /// Highest exit code among all contained errors.
    pub fn exit_code(&self) -> i32 {
        self.errors().map(|e| e.exit_code()).max().unwrap_or(1)
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        if !self.associated.is_empty() {
            write!(f, " (associated: ")?;
            for (i, err) in self.associated.iter().enumerate() {
                if i > 0 {
                    write!(f, "; ")?;
                }
                write!(f, "{err}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.primary.as_ref())
    }
}

/// # Errors building a run's execution context.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ContextError {
    /// The service identity is unusable (e.g. an empty name).
    #[error("invalid service identity: {reason}")]
    InvalidIdentity {
        /// Why the identity was rejected.
        reason: String,
    },

    /// Layered configuration could not be resolved.
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    /// Logger, tracer or meter could not be created.
    #[error("telemetry: {reason}")]
    Telemetry {
        /// Provider failure message.
        reason: String,
    },
}

/// # Errors produced by the servicevisor runtime.
///
/// These represent failures in the orchestration system itself,
/// such as a shutdown sequence exceeding its grace period.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some runs were still alive.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Run ids that did not exit in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            RuntimeError::GraceExceeded { .. } => EXIT_GRACE_EXCEEDED,
        }
    }
}
