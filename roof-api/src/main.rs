use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use roof_api::config::{self, Cli};
use roof_api::{AppState, build_provider_chain, build_router, logging};
use roof_core::db::RepositoryRegistry;
use roof_db_sqlite::SqliteRepositoryFactory;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(&cli)?;

    logging::init_logging(&config.server.log_level, config.server.log_file.as_deref())?;

    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));

    let repository = registry.create(&config.database).await.with_context(|| {
        format!(
            "Failed to open {} database: {}",
            config.database.backend, config.database.connection_string
        )
    })?;

    let chain = build_provider_chain(&config.providers);
    let state = Arc::new(AppState::new(
        repository,
        chain,
        config.pricing.coating_slug.clone(),
    ));

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("roof-server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
