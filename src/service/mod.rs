//! # Service abstractions.
//!
//! This module provides the caller-facing contract:
//! - [`Service`] - trait for long-running components (initialize / run / shutdown)
//! - [`ServiceRef`] - shared reference to a service (`Arc<dyn Service>`)
//! - [`Health`], [`HealthStatus`] - informational health reporting

mod contract;
mod health;

pub use contract::{Service, ServiceRef};
pub use health::{Health, HealthStatus};
