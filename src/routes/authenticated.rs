use crate::{AppState, auth, handlers};
use axum::{Router, middleware, routing::get};

/// Authenticated Router Module
///
/// Routes open to every role, as long as the caller carries a valid access token.
/// Only the authentication check is layered here.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /auth/me
        // Feeds the client auth context with the current user's id, email and role.
        .route("/auth/me", get(handlers::me))
        .route_layer(middleware::from_fn(auth::require_auth))
}
