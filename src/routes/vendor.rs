use crate::{
    AppState,
    auth::{self, AllowedRoles},
    handlers,
    models::Role,
};
use axum::{Router, middleware, routing::get};

/// Vendor Router Module
///
/// Nested under `/vendor`. Admins are admitted alongside vendors.
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/access", get(handlers::vendor_access))
        .route_layer(middleware::from_fn_with_state(
            AllowedRoles::new([Role::Vendor, Role::Admin]),
            auth::require_roles,
        ))
        // Layers run outermost-last: authentication is checked before the role.
        .route_layer(middleware::from_fn(auth::require_auth))
}
