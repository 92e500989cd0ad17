//! Caller identity resolution.
//!
//! The middleware never rejects a request. A valid bearer token attaches a
//! [`CallerIdentity`]; anything else leaves the request anonymous and the
//! access policy decides what an anonymous caller gets.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use localcloud_core::access::CallerIdentity;
use tracing::debug;

use crate::AppState;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Resolves the bearer token into a caller identity, if it verifies.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);

    if let Some(token) = token {
        match state.jwt_service.validate_token(token) {
            Ok(claims) => {
                request
                    .extensions_mut()
                    .insert(CallerIdentity::from(&claims));
            }
            Err(e) => debug!(error = %e, "Bearer token rejected, continuing anonymously"),
        }
    }

    next.run(request).await
}

/// Extractor for the caller identity, `None` when anonymous.
///
/// ```ignore
/// async fn handler(Caller(caller): Caller) -> impl IntoResponse {
///     service.list(caller.as_ref(), "internal", "").await
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Caller(pub Option<CallerIdentity>);

impl Caller {
    /// Borrowed identity, as the access policy takes it.
    #[must_use]
    pub fn identity(&self) -> Option<&CallerIdentity> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<CallerIdentity>().cloned()))
    }
}
