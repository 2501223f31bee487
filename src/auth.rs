use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    errors::AuthError,
    models::{Role, UserProfile},
    token::{AccessClaims, TokenService},
};

/// TokenState
///
/// The shared Token Service handle, pulled from the application state via `FromRef`.
pub type TokenState = Arc<TokenService>;

/// AuthUser
///
/// The resolved identity of an authenticated request, built from verified access-token
/// claims and attached to the request extensions by `resolve_identity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<AccessClaims> for AuthUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl From<&AuthUser> for UserProfile {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Lets handlers take `AuthUser` as an argument. The extractor only reads what
/// `resolve_identity` attached; it never verifies tokens itself.
///
/// Rejection: `AuthError::Unauthenticated` (401) when no identity is attached.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

/// AllowedRoles
///
/// The allow-list a protected operation declares. Cheap to clone; used as the state of
/// the `require_roles` middleware.
#[derive(Debug, Clone)]
pub struct AllowedRoles(Arc<[Role]>);

impl AllowedRoles {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self(roles.into_iter().collect())
    }

    pub fn permits(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

/// authorize
///
/// The single authorization predicate: authentication first, then allow-list membership.
/// Synchronous and side-effect free.
pub fn authorize(identity: Option<&AuthUser>, allowed: &AllowedRoles) -> Result<(), AuthError> {
    let user = identity.ok_or(AuthError::Unauthenticated)?;
    if !allowed.permits(user.role) {
        tracing::warn!(user_id = %user.id, role = %user.role, "role not permitted for route");
        return Err(AuthError::Forbidden);
    }
    Ok(())
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// resolve_identity
///
/// Request-scoped identity resolution, layered over the whole router. A valid access
/// token attaches an `AuthUser`; anything else leaves the request anonymous and lets the
/// route-level checks decide.
pub async fn resolve_identity(
    State(tokens): State<TokenState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Never trust an identity that arrived from outside this layer.
    request.extensions_mut().remove::<AuthUser>();

    if let Some(token) = bearer_token(request.headers()) {
        match tokens.verify_access(token) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthUser::from(claims));
            }
            Err(reason) => tracing::debug!(%reason, "bearer token rejected"),
        }
    }

    next.run(request).await
}

/// require_auth
///
/// Authentication check: rejects with 401 unless an identity is attached.
pub async fn require_auth(request: Request, next: Next) -> Result<Response, AuthError> {
    if request.extensions().get::<AuthUser>().is_none() {
        return Err(AuthError::Unauthenticated);
    }
    Ok(next.run(request).await)
}

/// require_roles
///
/// Role check, parameterized by the allow-list carried as middleware state:
///
/// ```ignore
/// router.route_layer(middleware::from_fn_with_state(
///     AllowedRoles::new([Role::Admin]),
///     require_roles,
/// ))
/// ```
///
/// Passes the request through untouched when the attached identity's role is permitted.
pub async fn require_roles(
    State(allowed): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    authorize(request.extensions().get::<AuthUser>(), &allowed)?;
    Ok(next.run(request).await)
}
