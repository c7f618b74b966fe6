//! # servicevisor
//!
//! **Servicevisor** is a lifecycle orchestrator for long-running services
//! embedded in one tokio process.
//!
//! Every service implements one contract, `initialize → run → shutdown`.
//! The [`Runner`] drives any number of them concurrently, hands back a
//! [`Handle`] per run for observation and control, and reports failures as one
//! aggregated [`RunError`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Service    │   │   Service    │   │   Service    │
//!     │ (user impl)  │   │ (user impl)  │   │ (user impl)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner                                                           │
//! │  - ContextFactory (identity, telemetry, config, env per run)      │
//! │  - Bus (broadcast events)                                         │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Lifecycle   │   │  Lifecycle   │   │  Lifecycle   │ ◄─── Handle
//!     │ (tokio task) │   │ (tokio task) │   │ (tokio task) │      (wait / shutdown)
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ PhaseChanged, ServiceFailed, ServiceExited, GroupCancelled, ...
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                (capacity: RunnerConfig::bus_capacity)             │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                            SubscriberSet ──► LogWriter, custom subscribers
//! ```
//!
//! ### Lifecycle
//! ```text
//! Waiting ─► Initializing ─► Running ─► ShuttingDown ─► Finished | Failed
//!                 │ Err                      ▲
//!                 └──────────────────────────┘  (shutdown always runs, once)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Services**      | The lifecycle contract and health reporting.                  | [`Service`], [`Health`]                     |
//! | **Orchestration** | Single, parallel and grouped runs; waiting and process exit.  | [`Runner`], [`Handle`], [`RunReport`]       |
//! | **Context**       | Per-run cancellation, identity, telemetry, config and env.    | [`ServiceContext`], [`ServiceIdentity`]     |
//! | **Subscriber API**| Hook into lifecycle events.                                   | [`Subscribe`], [`LogWriter`]                |
//! | **Errors**        | Typed, severity-ordered errors with exit codes.               | [`ServiceError`], [`RunError`]              |
//! | **Telemetry**     | `tracing` logger/tracer and prometheus meter per run.         | [`TelemetryProvider`], [`init_logging`]     |
//! | **Configuration** | Layered file + env configuration, runner settings.            | [`ConfigOptions`], [`RunnerConfig`]         |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use servicevisor::{BoxError, Runner, Service, ServiceContext};
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Service for Hello {
//!     fn name(&self) -> &str { "hello" }
//!     fn version(&self) -> &str { "0.1.0" }
//!
//!     async fn initialize(&self, ctx: &ServiceContext) -> Result<(), BoxError> {
//!         ctx.info("ready");
//!         Ok(())
//!     }
//!
//!     async fn run(&self, ctx: &ServiceContext) -> Result<(), BoxError> {
//!         ctx.info(format!("hello from {}", ctx.run_id()));
//!         Ok(())
//!     }
//!
//!     async fn shutdown(&self, _ctx: &ServiceContext) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = Runner::new();
//!     let report = runner
//!         .run_group_and_wait(&CancellationToken::new(), vec![Arc::new(Hello)])
//!         .await;
//!     report.into_result()?;
//!     Ok(())
//! }
//! ```
pub mod config;
mod context;
mod core;
mod error;
mod events;
mod observability;
mod service;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{Handle, Phase, RunOutcome, RunReport, Runner, RunnerBuilder, RunnerConfig};
pub use config::{ConfigError, ConfigOptions, EnvSnapshot, ResolvedConfig};
pub use context::{ContextFactory, ServiceContext, ServiceIdentity};
pub use error::{BoxError, ContextError, EXIT_GRACE_EXCEEDED, RunError, RuntimeError, ServiceError};
pub use events::{Bus, Event, EventKind};
pub use observability::{
    DefaultTelemetry, LogFormat, LogOptions, Logger, LoggingError, Meter, TelemetryProvider,
    Tracer, init_logging,
};
pub use service::{Health, HealthStatus, Service, ServiceRef};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
