//! # Identity of one service run.
//!
//! The run id disambiguates repeated runs of the same service:
//!
//! ```text
//! flowseer/example@0.0.1/1718000000123456789-7
//! └──┬───┘ └──┬──┘ └─┬─┘ └────────┬────────┘ └ process-wide run sequence
//! namespace  name  version  start (unix nanos)
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ContextError;
use crate::service::Service;

/// Process-wide run counter.
static RUN_SEQ: AtomicU64 = AtomicU64::new(0);

/// Name, namespace, version and run id of a service run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceIdentity {
    name: Arc<str>,
    namespace: Arc<str>,
    version: Arc<str>,
    run_id: Arc<str>,
    started_at: SystemTime,
}

impl ServiceIdentity {
    /// Creates an identity stamped with the current time.
    pub fn new(name: &str, namespace: &str, version: &str) -> Self {
        let started_at = SystemTime::now();
        let nanos = started_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let seq = RUN_SEQ.fetch_add(1, Ordering::Relaxed);

        let run_id = if namespace.is_empty() {
            format!("{name}@{version}/{nanos}-{seq}")
        } else {
            format!("{namespace}/{name}@{version}/{nanos}-{seq}")
        };

        Self {
            name: name.into(),
            namespace: namespace.into(),
            version: version.into(),
            run_id: run_id.into(),
            started_at,
        }
    }

    /// Identity for a new run of `svc`.
    pub fn of(svc: &dyn Service) -> Self {
        Self::new(svc.name(), svc.namespace(), svc.version())
    }

    /// Rejects identities the runtime cannot key telemetry on.
    pub fn validate(&self) -> Result<(), ContextError> {
        if self.name.trim().is_empty() {
            return Err(ContextError::InvalidIdentity {
                reason: "service name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Service namespace (may be empty).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Service version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Run-unique id.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Shared run id, for event payloads.
    pub(crate) fn run_id_arc(&self) -> Arc<str> {
        Arc::clone(&self.run_id)
    }

    /// When the run was created.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{} @ {}", self.name, self.version)
        } else {
            write!(f, "{}/{} @ {}", self.namespace, self.name, self.version)
        }
    }
}
