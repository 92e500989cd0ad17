//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::identity_middleware};

pub mod files;
pub mod health;

/// Creates the API router with routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // File routes see an optional caller identity
    let file_routes = Router::new()
        .merge(files::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    Router::new().merge(health::routes()).merge(file_routes)
}
