use abacus::ai::providers::ProviderClient;
use abacus::config::{self, ServerConfig};
use abacus::logging;
use abacus::server::{self, ServerError};
use anyhow::Context;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    // Environment is seeded before the runtime spawns its worker threads.
    config::load_dotenv();
    logging::init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?
        .block_on(run())
}

async fn run() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("Failed to read server configuration")?;
    let settings = config.provider.as_ref().ok_or(ServerError::NoProvider)?;
    let provider = ProviderClient::from_settings(settings);
    tracing::info!(provider = provider.name(), "model provider selected");

    server::serve(&config, Arc::new(provider))
        .await
        .context("Server error")?;
    Ok(())
}
