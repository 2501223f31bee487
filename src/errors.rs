use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorBody;

/// ConfigError
///
/// Raised while loading `AppConfig` or constructing the `TokenService`.
/// Every variant is fatal: the process must not start serving requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// InvalidToken
///
/// The explicit "invalid" outcome of token verification. The Token Service returns
/// this instead of panicking; callers decide how to react. `Expired` is kept distinct
/// for logging but is surfaced to HTTP clients exactly like the other variants.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidToken {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not verify")]
    BadSignature,

    #[error("token has expired")]
    Expired,
}

/// StoreError
///
/// Failure talking to the external identity store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("identity store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity store answered with status {0}")]
    UnexpectedStatus(u16),
}

/// AuthError
///
/// Request-terminal failures of the access-control layer. Each variant maps to a
/// status code and a `{message}` body.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthorized - User not authenticated")]
    Unauthenticated,

    #[error("Forbidden - You do not have permission to access this resource")]
    Forbidden,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Identity service unavailable")]
    IdentityStore(#[from] StoreError),

    #[error("Internal server error")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::IdentityStore(_) => StatusCode::BAD_GATEWAY,
            AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InvalidToken> for AuthError {
    fn from(_: InvalidToken) -> Self {
        AuthError::Unauthenticated
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::IdentityStore(e) => tracing::error!(error = %e, "identity store failure"),
            AuthError::Signing(e) => tracing::error!(error = %e, "token signing failure"),
            _ => {}
        }

        // Display strings carry no internal detail, so they double as the public message.
        let body = ErrorBody {
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
