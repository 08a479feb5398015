use anyhow::Context;

use storefront_api::config::AppConfig;
use storefront_api::gateway::Gateway;
use storefront_api::{logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up SUPABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    logging::init(&config);
    tracing::info!(environment = ?config.environment, port = config.port, "Starting storefront API");

    let gateway = Gateway::supabase(&config.backend).context("failed to build backend client")?;
    server::run(config, gateway).await
}
