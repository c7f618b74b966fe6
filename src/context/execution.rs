//! # Execution context passed to every lifecycle callback.
//!
//! ```text
//! ServiceContext (Clone, one per run)
//!   ├─ token      CancellationToken   (child of the runner's base / group token)
//!   ├─ identity   Arc<ServiceIdentity>
//!   ├─ logger     Logger              (span with service fields)
//!   ├─ tracer     Tracer              (root span of the run)
//!   ├─ meter      Meter               (per-run prometheus registry)
//!   ├─ config     Arc<ResolvedConfig> (resolved once)
//!   └─ env        Arc<EnvSnapshot>    (captured once)
//! ```
//!
//! Everything but the token is immutable after construction.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::config::{ConfigError, EnvSnapshot, ResolvedConfig};
use crate::context::ServiceIdentity;
use crate::observability::{Logger, Meter, Tracer};

/// Cancellation scope plus observability attachments of one service run.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    token: CancellationToken,
    identity: Arc<ServiceIdentity>,
    logger: Logger,
    tracer: Tracer,
    meter: Meter,
    config: Arc<ResolvedConfig>,
    env: Arc<EnvSnapshot>,
}

impl ServiceContext {
    pub(crate) fn new(
        token: CancellationToken,
        identity: Arc<ServiceIdentity>,
        logger: Logger,
        tracer: Tracer,
        meter: Meter,
        config: ResolvedConfig,
        env: EnvSnapshot,
    ) -> Self {
        Self {
            token,
            identity,
            logger,
            tracer,
            meter,
            config: Arc::new(config),
            env: Arc::new(env),
        }
    }

    /// Cancellation token of the run.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Completes once the run is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// True once the run is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Identity of the run.
    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    pub(crate) fn identity_arc(&self) -> Arc<ServiceIdentity> {
        Arc::clone(&self.identity)
    }

    /// Service name.
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    /// Service namespace.
    pub fn namespace(&self) -> &str {
        self.identity.namespace()
    }

    /// Service version.
    pub fn version(&self) -> &str {
        self.identity.version()
    }

    /// Run id.
    pub fn run_id(&self) -> &str {
        self.identity.run_id()
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    /// Deserializes the resolved configuration into `T`.
    ///
    /// ```
    /// # use servicevisor::ServiceContext;
    /// #[derive(serde::Deserialize)]
    /// struct Settings {
    ///     #[serde(default)]
    ///     port: u16,
    /// }
    ///
    /// fn settings(ctx: &ServiceContext) -> u16 {
    ///     ctx.config::<Settings>().map(|s| s.port).unwrap_or(8080)
    /// }
    /// ```
    pub fn config<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        self.config.get()
    }

    /// The resolved configuration as a whole.
    pub fn resolved_config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Environment captured when the context was built.
    pub fn env(&self) -> &EnvSnapshot {
        &self.env
    }

    /// Shorthand for `self.logger().debug(msg)`.
    pub fn debug(&self, msg: impl std::fmt::Display) {
        self.logger.debug(msg);
    }

    /// Shorthand for `self.logger().info(msg)`.
    pub fn info(&self, msg: impl std::fmt::Display) {
        self.logger.info(msg);
    }

    /// Shorthand for `self.logger().warn(msg)`.
    pub fn warn(&self, msg: impl std::fmt::Display) {
        self.logger.warn(msg);
    }

    /// Shorthand for `self.logger().error(msg)`.
    pub fn error(&self, msg: impl std::fmt::Display) {
        self.logger.error(msg);
    }
}
