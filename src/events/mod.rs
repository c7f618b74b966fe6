//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by service lifecycles, handles, the
//! runner and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: lifecycle tasks (phases, failures, exit, group cancel),
//!   `Handle::shutdown` (shutdown requested/failed), `Runner::*_and_exit`
//!   (signal, grace outcome), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the runner's listener task (fans out to `SubscriberSet`),
//!   plus any receiver opened through [`Runner::bus`](crate::Runner::bus).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
