//! Per-run execution context.
//!
//! ## Contents
//! - [`ServiceIdentity`] name, namespace, version and run id of one run
//! - [`ServiceContext`] cancellation scope plus logger, tracer, meter, config and env
//! - [`ContextFactory`] builds contexts from an identity (used by the runner)

mod execution;
mod factory;
mod identity;

pub use execution::ServiceContext;
pub use factory::ContextFactory;
pub use identity::ServiceIdentity;
