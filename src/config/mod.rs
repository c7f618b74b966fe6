//! Environment and layered configuration.
//!
//! ## Contents
//! - [`env_name`], [`normalize_env_name`] naming rules for environment variables
//! - [`EnvSnapshot`] the process environment, captured once per run
//! - [`ConfigOptions`] which layers to load and how they rank
//! - [`ResolvedConfig`] the merged result attached to each execution context
//!
//! ## Quick wiring
//! ```text
//! RunnerConfig.config (ConfigOptions)
//!      └─► ContextFactory::build(service)
//!            ├─ EnvSnapshot::capture()
//!            └─ ResolvedConfig::load(opts, service.name(), &env)
//!                 └─► ServiceContext::config::<T>()
//! ```

mod env;
mod error;
mod loader;
mod options;

pub use env::{DEFAULT_ENV_PREFIX, EnvSnapshot, env_name, normalize_env_name};
pub use error::ConfigError;
pub use loader::ResolvedConfig;
pub use options::ConfigOptions;
