use crate::{
    AppState,
    auth::{self, AllowedRoles},
    handlers,
    models::Role,
};
use axum::{Router, middleware, routing::get};

/// Admin Router Module
///
/// Nested under `/admin`. Every route here is gated on the `admin` role.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/access", get(handlers::admin_access))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles::new([Role::Admin]),
            auth::require_roles,
        ))
        .route_layer(middleware::from_fn(auth::require_auth))
}
