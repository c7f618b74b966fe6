//! # Event subscribers for the servicevisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   lifecycle ── publish(Event) ──► Bus ──► Runner listener ──► SubscriberSet::emit
//!                                                                    │
//!                                                     ┌──────────────┼──────────┐
//!                                                     ▼              ▼          ▼
//!                                                 LogWriter       Metrics    Custom
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
