use anyhow::Context;
use tracing::info;

use pratilipi_recs::api::{create_router, AppState, ShellSettings};
use pratilipi_recs::config::Config;
use pratilipi_recs::services::ArtifactStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // Artifacts are loaded once; a missing or corrupt file stops startup
    let store = ArtifactStore::load(&config.artifact_paths())
        .context("Failed to load recommendation artifacts")?;
    let status = store.status();
    let engine = store.into_engine();

    let state = AppState::new(engine, status, ShellSettings::from_config(&config));
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}
