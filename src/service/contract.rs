//! # Service contract.
//!
//! A [`Service`] is a long-running component with a fixed lifecycle:
//!
//! ```text
//! initialize(ctx) ──► run(ctx) ──► shutdown(ctx)
//!        │ Err                         ▲
//!        └─────────────────────────────┘   (shutdown always runs)
//! ```
//!
//! All three callbacks receive the run's [`ServiceContext`]. `run` is expected to
//! block until its work is done, it fails, or `ctx` is cancelled.
//!
//! The common handle type is [`ServiceRef`], an `Arc<dyn Service>`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ServiceContext;
use crate::error::BoxError;
use crate::service::Health;

/// Shared reference to a service.
pub type ServiceRef = Arc<dyn Service>;

/// # Long-running component with an initialize/run/shutdown lifecycle.
///
/// One value may be run several times, sequentially or concurrently; the
/// implementation is responsible for refusing re-entry it cannot support.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use servicevisor::{BoxError, Service, ServiceContext};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl Service for Ticker {
///     fn name(&self) -> &str { "ticker" }
///     fn version(&self) -> &str { "0.1.0" }
///
///     async fn initialize(&self, _ctx: &ServiceContext) -> Result<(), BoxError> {
///         Ok(())
///     }
///
///     async fn run(&self, ctx: &ServiceContext) -> Result<(), BoxError> {
///         ctx.cancelled().await;
///         Ok(())
///     }
///
///     async fn shutdown(&self, _ctx: &ServiceContext) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Stable, non-empty identifier.
    fn name(&self) -> &str;

    /// Optional grouping identifier.
    fn namespace(&self) -> &str {
        ""
    }

    /// Free-form version string (`"1.2.3"`, `"2024-06-01"`, ...).
    fn version(&self) -> &str;

    /// Prepares the service. An error skips `run`; `shutdown` still runs.
    async fn initialize(&self, ctx: &ServiceContext) -> Result<(), BoxError>;

    /// Main loop. Should return promptly once `ctx` is cancelled.
    async fn run(&self, ctx: &ServiceContext) -> Result<(), BoxError>;

    /// Releases resources. Called at most once per run, also after `run` failed.
    async fn shutdown(&self, ctx: &ServiceContext) -> Result<(), BoxError>;

    /// Informational health snapshot.
    fn health(&self) -> Health {
        Health::unknown()
    }
}
