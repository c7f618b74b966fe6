//! Runtime core: orchestration and lifecycle.
//!
//! Public API: [`Runner`] (+ [`RunnerBuilder`], [`RunnerConfig`]), [`Handle`],
//! [`Phase`] and [`RunReport`].
//!
//! Internal modules:
//! - [`lifecycle`]: drives one run through initialize/run/shutdown, group cancellation;
//! - [`handle`]: per-run state, shutdown gate and exit signal;
//! - [`runner`]: builds contexts and handles, spawns lifecycles, process exit;
//! - [`shutdown`]: cross-platform termination signals.
//!
//! ## Wiring
//! ```text
//! Runner::run_group(base, services)
//!   ├─ ContextFactory::build(identity, token) ──► Err ─► Handle::failed (no service call)
//!   ├─ Handle::new(service, ctx)
//!   └─ tokio::spawn(Lifecycle::run)
//!          ├─ publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!          └─ exit ──► GroupScope::on_exit ──► cancel siblings (once)
//! ```

mod builder;
mod config;
mod handle;
mod lifecycle;
mod phase;
mod report;
mod runner;
mod shutdown;

#[cfg(test)]
mod tests;

pub use builder::RunnerBuilder;
pub use config::RunnerConfig;
pub use handle::Handle;
pub use phase::Phase;
pub use report::{RunOutcome, RunReport};
pub use runner::Runner;
