//! # Builds one [`ServiceContext`] per run.
//!
//! ```text
//! ContextFactory::build(identity, token)
//!   ├─ identity.validate()                       ── ContextError::InvalidIdentity
//!   ├─ EnvSnapshot::capture()
//!   ├─ ResolvedConfig::load(opts, name, &env)    ── ContextError::Config
//!   └─ provider.logger / tracer / meter          ── ContextError::Telemetry
//! ```
//!
//! The runner calls the factory synchronously inside `run*`, so a failure is
//! known before any task is spawned.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{ConfigOptions, EnvSnapshot, ResolvedConfig};
use crate::context::{ServiceContext, ServiceIdentity};
use crate::error::ContextError;
use crate::observability::{DefaultTelemetry, TelemetryProvider};

/// Produces execution contexts from an identity.
///
/// Public so that services can be unit-tested with the same context the runner builds.
#[derive(Clone)]
pub struct ContextFactory {
    telemetry: Arc<dyn TelemetryProvider>,
    config: ConfigOptions,
}

impl ContextFactory {
    /// Factory with the given telemetry provider and configuration options.
    pub fn new(telemetry: Arc<dyn TelemetryProvider>, config: ConfigOptions) -> Self {
        Self { telemetry, config }
    }

    /// Configuration options used for every context.
    pub fn config_options(&self) -> &ConfigOptions {
        &self.config
    }

    /// Builds the context for `identity`, bound to `token`.
    pub fn build(
        &self,
        identity: Arc<ServiceIdentity>,
        token: CancellationToken,
    ) -> Result<ServiceContext, ContextError> {
        identity.validate()?;

        let env = EnvSnapshot::capture();
        let config = ResolvedConfig::load(&self.config, identity.name(), &env)?;

        let logger = self.telemetry.logger(&identity)?;
        let tracer = self.telemetry.tracer(&identity)?;
        let meter = self.telemetry.meter(&identity)?;

        Ok(ServiceContext::new(
            token, identity, logger, tracer, meter, config, env,
        ))
    }
}

impl Default for ContextFactory {
    fn default() -> Self {
        Self::new(Arc::new(DefaultTelemetry), ConfigOptions::default())
    }
}

impl std::fmt::Debug for ContextFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::Meter;

    struct BrokenMeter;

    impl TelemetryProvider for BrokenMeter {
        fn meter(&self, _id: &ServiceIdentity) -> Result<Meter, ContextError> {
            Err(ContextError::Telemetry {
                reason: "exporter unavailable".into(),
            })
        }
    }

    fn quiet_opts() -> ConfigOptions {
        ConfigOptions::default().with_env_vars(false)
    }

    #[test]
    fn test_build_attaches_identity_and_token() {
        let factory = ContextFactory::new(Arc::new(DefaultTelemetry), quiet_opts());
        let id = Arc::new(ServiceIdentity::new("worker", "ns", "1.0"));
        let token = CancellationToken::new();

        let ctx = factory.build(Arc::clone(&id), token.clone()).unwrap();
        assert_eq!(ctx.name(), "worker");
        assert_eq!(ctx.namespace(), "ns");
        assert_eq!(ctx.run_id(), id.run_id());
        assert!(!ctx.is_cancelled());

        token.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_empty_name_fails() {
        let factory = ContextFactory::default();
        let err = factory
            .build(Arc::new(ServiceIdentity::new("", "", "1")), CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, ContextError::InvalidIdentity { .. }));
    }

    #[test]
    fn test_provider_failure_is_reported() {
        let factory = ContextFactory::new(Arc::new(BrokenMeter), quiet_opts());
        let err = factory
            .build(Arc::new(ServiceIdentity::new("svc", "", "1")), CancellationToken::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "telemetry: exporter unavailable");
    }

    #[test]
    fn test_missing_config_file_fails() {
        let opts = quiet_opts().with_file("/nope/missing.yaml");
        let factory = ContextFactory::new(Arc::new(DefaultTelemetry), opts);
        let err = factory
            .build(Arc::new(ServiceIdentity::new("svc", "", "1")), CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, ContextError::Config(_)));
    }
}
