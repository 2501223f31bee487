use axum::{Json, extract::State};

use crate::{
    auth::{AuthUser, TokenState},
    errors::AuthError,
    identity::IdentityState,
    models::{
        AreaAccess, ErrorBody, LoginRequest, RefreshRequest, SessionResponse, TokenPair,
        UserProfile,
    },
};

// --- Handlers ---

/// login
///
/// [Public Route] Exchanges credentials for a token pair.
///
/// *Flow*: the identity store checks the credentials and returns the identity record;
/// the Token Service signs an access token for it and a refresh token for its id.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Bad credentials", body = ErrorBody),
        (status = 502, description = "Identity store unavailable", body = ErrorBody)
    )
)]
pub async fn login(
    State(tokens): State<TokenState>,
    State(identities): State<IdentityState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AuthError> {
    let identity = identities
        .verify_credentials(&payload.email, &payload.password)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let pair = tokens.issue_tokens(&identity)?;
    tracing::info!(user_id = %identity.id, role = %identity.role, "session issued");

    Ok(Json(SessionResponse {
        tokens: pair,
        user: UserProfile::from(&identity),
    }))
}

/// refresh
///
/// [Public Route] Mints a new access token from a refresh token.
///
/// The identity is re-read from the store so role changes take effect. The presented
/// refresh token is handed back unchanged: its expiry is absolute.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Refreshed", body = SessionResponse),
        (status = 401, description = "Invalid refresh token", body = ErrorBody)
    )
)]
pub async fn refresh(
    State(tokens): State<TokenState>,
    State(identities): State<IdentityState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<SessionResponse>, AuthError> {
    let claims = tokens.verify_refresh(&payload.refresh_token).map_err(|reason| {
        tracing::debug!(%reason, "refresh token rejected");
        AuthError::from(reason)
    })?;

    let identity = identities
        .find_identity(claims.sub)
        .await?
        .ok_or(AuthError::Unauthenticated)?;

    let access_token = tokens.issue_access(&identity)?;

    Ok(Json(SessionResponse {
        tokens: TokenPair {
            access_token,
            refresh_token: payload.refresh_token,
        },
        user: UserProfile::from(&identity),
    }))
}

/// me
///
/// [Authenticated Route] Returns the identity asserted by the caller's access token.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Not signed in", body = ErrorBody)
    )
)]
pub async fn me(user: AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

/// vendor_access
///
/// [Vendor Route] Confirms access to the vendor area (vendors and admins).
#[utoipa::path(
    get,
    path = "/vendor/access",
    responses(
        (status = 200, description = "Granted", body = AreaAccess),
        (status = 401, description = "Not signed in", body = ErrorBody),
        (status = 403, description = "Wrong role", body = ErrorBody)
    )
)]
pub async fn vendor_access(user: AuthUser) -> Json<AreaAccess> {
    Json(area_access("vendor", &user))
}

/// admin_access
///
/// [Admin Route] Confirms access to the admin area.
#[utoipa::path(
    get,
    path = "/admin/access",
    responses(
        (status = 200, description = "Granted", body = AreaAccess),
        (status = 401, description = "Not signed in", body = ErrorBody),
        (status = 403, description = "Wrong role", body = ErrorBody)
    )
)]
pub async fn admin_access(user: AuthUser) -> Json<AreaAccess> {
    Json(area_access("admin", &user))
}

fn area_access(area: &str, user: &AuthUser) -> AreaAccess {
    AreaAccess {
        area: area.to_string(),
        user: UserProfile::from(user),
    }
}
