use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token. Login and refresh are the entry points that
/// produce tokens in the first place.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/login
        .route("/auth/login", post(handlers::login))
        // POST /auth/refresh
        // Accepts refresh tokens only; access tokens are rejected here.
        .route("/auth/refresh", post(handlers::refresh))
}
