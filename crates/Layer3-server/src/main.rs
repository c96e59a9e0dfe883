//! stackd - local stack control-plane agent

use std::sync::Arc;

use anyhow::Context;
use stackd_exec::{CliExecutor, Executor};
use stackd_foundation::Config;
use stackd_server::Server;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env();

    // The in-process runner is an external collaborator; the shipped binary
    // drives the stack CLI. Embedders wire LocalExecutor with their runner.
    let executor: Arc<dyn Executor> =
        Arc::new(CliExecutor::new(config.stack_binary.clone()));

    info!(
        executor = executor.name(),
        listen_addr = %config.listen_addr,
        "starting stackd"
    );

    Server::new(config, executor)
        .serve()
        .await
        .context("server exited with an error")?;

    info!("stackd stopped");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
