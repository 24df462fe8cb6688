//! Climate Observation API - Main Entry Point

use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_logging(&settings.logging)?;

    info!("=== Climate API v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", settings.storage.database_url);

    run_server(settings).await
}
