//! Example service: reads its config, sleeps, then fails on shutdown.
//!
//! ```text
//! EXAMPLE_TEST=hello SERVICE_LOG_FORMAT=text cargo run --example example_service
//! ```
//!
//! Exits with code 1 ("shutdown failed: test") after about two seconds, or
//! earlier on Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use servicevisor::{
    BoxError, EnvSnapshot, Health, LogOptions, Runner, Service, ServiceContext, init_logging,
};

#[derive(Debug, Default, Deserialize)]
struct ExampleConfig {
    #[serde(default)]
    test: String,
}

struct ExampleService;

#[async_trait]
impl Service for ExampleService {
    fn name(&self) -> &str {
        "example"
    }

    fn namespace(&self) -> &str {
        "flowseer"
    }

    fn version(&self) -> &str {
        "0.0.1"
    }

    async fn initialize(&self, ctx: &ServiceContext) -> Result<(), BoxError> {
        let cfg: ExampleConfig = ctx.config()?;
        ctx.info(format!("config: {cfg:?}"));
        Ok(())
    }

    async fn run(&self, ctx: &ServiceContext) -> Result<(), BoxError> {
        ctx.info("Sleeping for 2 seconds...");
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(2)) => ctx.info("Done sleeping."),
            _ = ctx.cancelled() => ctx.warn("Cancelled while sleeping."),
        }
        Ok(())
    }

    async fn shutdown(&self, _ctx: &ServiceContext) -> Result<(), BoxError> {
        Err("test".into())
    }

    fn health(&self) -> Health {
        Health::unknown()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LogOptions::from_env(&EnvSnapshot::capture(), ""))?;

    Runner::new().run_and_exit(Arc::new(ExampleService)).await
}
