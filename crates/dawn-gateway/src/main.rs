//! Dawn Gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p dawn-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use anyhow::Context;
use dawn_common::{try_init_tracing, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "Gateway failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    if let Err(e) = try_init_tracing(&TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        address = %config.gateway.address(),
        database = config.database.is_some(),
        redis = config.redis.is_some(),
        "Starting Dawn Gateway"
    );

    dawn_gateway::run(config).await?;

    Ok(())
}
