//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - File routes: list, download and the WebSocket upload exchange
//! - Identity middleware that resolves bearer tokens without rejecting
//! - JSON error responses built from the shared `AppError`

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use localcloud_core::files::FileService;
use localcloud_core::storage::StorageBackend;
use localcloud_db::FileRepository;
use localcloud_shared::JwtService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Storage roots for both storage classes.
    pub storage: Arc<StorageBackend>,
}

impl AppState {
    /// File service over this state's pool and storage.
    #[must_use]
    pub fn file_service(&self) -> FileService<FileRepository> {
        let repo = FileRepository::new((*self.db).clone());
        FileService::new(Arc::clone(&self.storage), Arc::new(repo))
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
