use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Server tier: token issuance/verification and role authorization.
pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod token;

// Client tier: route guards over the session state.
pub mod session;

// Module for routing segregation (Public, Authenticated, Vendor, Admin).
pub mod routes;
use routes::{admin, authenticated, public, vendor};

// --- Public Re-exports ---

pub use auth::TokenState;
pub use config::AppConfig;
pub use identity::{IdentityState, InMemoryIdentityStore, SupabaseIdentityStore};
pub use token::TokenService;

/// ApiDoc
///
/// Aggregates the documented paths and schemas into the OpenAPI document served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::refresh, handlers::me,
        handlers::vendor_access, handlers::admin_access
    ),
    components(
        schemas(
            models::Role, models::LoginRequest, models::RefreshRequest, models::TokenPair,
            models::SessionResponse, models::UserProfile, models::AreaAccess, models::ErrorBody,
        )
    ),
    tags(
        (name = "marketplace-access", description = "Marketplace session and authorization API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container of shared services. Nothing in it is mutated after
/// startup, so requests can run concurrently without coordination.
#[derive(Clone)]
pub struct AppState {
    /// Token Service: signs and verifies access and refresh tokens.
    pub tokens: TokenState,
    /// Identity Store: the external credential and profile backend.
    pub identities: IdentityState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for TokenState {
    fn from_ref(app_state: &AppState) -> TokenState {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identities.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure. Identity resolution wraps every route; each
/// protected module layers its own authentication and role checks.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .nest("/vendor", vendor::vendor_routes())
        .nest("/admin", admin::admin_routes())
        // Bearer token → AuthUser, for every route.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_identity,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span, tagged with the `x-request-id` so every log line of a
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
