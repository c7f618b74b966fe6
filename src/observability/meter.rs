//! # Per-run metrics registry.
//!
//! Each run gets its own [`prometheus::Registry`] with:
//! - a metric name prefix derived from the service name (`my-svc` → `my_svc_`),
//!   omitted when the name has no ASCII letters or digits
//! - const labels `service`, `version` and, when set, `namespace`
//!
//! ## Example
//! ```rust
//! use servicevisor::{Meter, ServiceIdentity};
//!
//! let meter = Meter::for_identity(&ServiceIdentity::new("api", "", "1.0")).unwrap();
//! let hits = meter.counter("hits_total", "Requests served").unwrap();
//! hits.inc();
//! assert!(meter.encode().contains("api_hits_total"));
//! ```

use std::collections::HashMap;
use std::fmt;

use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

use crate::config::normalize_env_name;
use crate::context::ServiceIdentity;

/// Metrics registry bound to one service run.
#[derive(Clone)]
pub struct Meter {
    registry: Registry,
}

impl Meter {
    /// Creates a registry prefixed and labelled with `id`.
    pub fn for_identity(id: &ServiceIdentity) -> Result<Self, prometheus::Error> {
        let mut labels = HashMap::new();
        labels.insert("service".to_string(), id.name().to_string());
        labels.insert("version".to_string(), id.version().to_string());
        if !id.namespace().is_empty() {
            labels.insert("namespace".to_string(), id.namespace().to_string());
        }

        let registry = Registry::new_custom(metric_prefix(id.name()), Some(labels))?;
        Ok(Self { registry })
    }

    /// Meter over an existing registry.
    pub fn from_registry(registry: Registry) -> Self {
        Self { registry }
    }

    /// Underlying registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registers a monotonic counter.
    pub fn counter(&self, name: &str, help: &str) -> Result<IntCounter, prometheus::Error> {
        let counter = IntCounter::new(name, help)?;
        self.registry.register(Box::new(counter.clone()))?;
        Ok(counter)
    }

    /// Registers a gauge.
    pub fn gauge(&self, name: &str, help: &str) -> Result<Gauge, prometheus::Error> {
        let gauge = Gauge::new(name, help)?;
        self.registry.register(Box::new(gauge.clone()))?;
        Ok(gauge)
    }

    /// Registers a histogram with default buckets.
    pub fn histogram(&self, name: &str, help: &str) -> Result<Histogram, prometheus::Error> {
        let histogram = Histogram::with_opts(HistogramOpts::new(name, help))?;
        self.registry.register(Box::new(histogram.clone()))?;
        Ok(histogram)
    }

    /// Renders every registered metric in the text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl fmt::Debug for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meter").finish_non_exhaustive()
    }
}

/// `my-svc` → `my_svc`; `None` when nothing usable is left.
fn metric_prefix(name: &str) -> Option<String> {
    let prefix = normalize_env_name(name).to_ascii_lowercase();
    (!prefix.is_empty()).then_some(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_carry_prefix_and_labels() {
        let id = ServiceIdentity::new("my-svc", "flowseer", "0.0.1");
        let meter = Meter::for_identity(&id).unwrap();
        let c = meter.counter("requests_total", "requests").unwrap();
        c.inc_by(3);

        let text = meter.encode();
        assert!(text.contains("my_svc_requests_total"), "{text}");
        assert!(text.contains("service=\"my-svc\""), "{text}");
        assert!(text.contains("namespace=\"flowseer\""), "{text}");
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let meter = Meter::for_identity(&ServiceIdentity::new("svc", "", "1")).unwrap();
        meter.gauge("depth", "queue depth").unwrap();
        assert!(meter.gauge("depth", "queue depth").is_err());
    }

    #[test]
    fn test_name_without_ascii_drops_prefix() {
        for name in ["サービス", "---"] {
            let meter = Meter::for_identity(&ServiceIdentity::new(name, "", "1")).unwrap();
            meter.counter("hits_total", "hits").unwrap().inc();

            let text = meter.encode();
            assert!(text.contains("\nhits_total{"), "{text}");
            assert!(text.contains(&format!("service=\"{name}\"")), "{text}");
        }
    }
}
