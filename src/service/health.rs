//! # Health reporting for services.
//!
//! [`Health`] is informational only: the runtime never changes a run's phase
//! because of it. It serializes to JSON for external status endpoints.
//!
//! ```rust
//! use servicevisor::{Health, HealthStatus};
//!
//! let h = Health::degraded("replica lag").with_detail("lag_ms", 1200);
//! assert_eq!(h.status, HealthStatus::Degraded);
//! assert_eq!(h.details["lag_ms"], 1200);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operational condition of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// No health information available (default).
    #[default]
    Unknown,
    /// Fully operational.
    Healthy,
    /// Running with reduced functionality.
    Degraded,
    /// Failed or non-operational.
    Error,
    /// Intentionally shut down, not because of an error.
    Shutdown,
}

impl HealthStatus {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Unknown => "unknown",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Error => "error",
            HealthStatus::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health snapshot of a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Current status.
    pub status: HealthStatus,
    /// Short human-readable explanation.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Structured diagnostics.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
    /// Error message behind a non-healthy status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Health {
    /// Health with the given status and reason.
    pub fn new(status: HealthStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            ..Self::default()
        }
    }

    /// `Unknown`, no reason.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// `Healthy`, no reason.
    pub fn healthy() -> Self {
        Self::new(HealthStatus::Healthy, "")
    }

    /// `Degraded` with a reason.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self::new(HealthStatus::Degraded, reason)
    }

    /// `Error` built from an error value.
    pub fn error(reason: impl Into<String>, err: &dyn std::error::Error) -> Self {
        Self::new(HealthStatus::Error, reason).with_error(err.to_string())
    }

    /// Adds one detail entry.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Sets the error message.
    pub fn with_error(mut self, err: impl Into<String>) -> Self {
        self.error = Some(err.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_compactly() {
        let json = serde_json::to_value(Health::healthy()).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "healthy" }));
    }

    #[test]
    fn test_error_health_carries_message() {
        let io = std::io::Error::other("disk full");
        let h = Health::error("cannot write", &io).with_detail("free_bytes", 0);
        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "disk full");
        assert_eq!(json["details"]["free_bytes"], 0);
        let back: Health = serde_json::from_value(json).unwrap();
        assert_eq!(back, h);
    }
}
