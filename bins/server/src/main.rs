//! LocalCloud gateway server.
//!
//! Main entry point for the file gateway service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use localcloud_api::{AppState, create_router};
use localcloud_core::storage::{StorageBackend, StorageClass, StorageConfig};
use localcloud_db::connect;
use localcloud_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "localcloud=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database).await?;
    info!("Connected to metadata store");

    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));

    let storage = StorageBackend::from_config(&StorageConfig::from(&config.storage))
        .context("Failed to initialise storage roots")?;
    info!(
        internal = storage.root(StorageClass::Internal).provider_name(),
        external = storage.root(StorageClass::External).provider_name(),
        chunk_size = storage.chunk_size(),
        "Storage roots ready"
    );

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage: Arc::new(storage),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
