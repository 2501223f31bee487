//! Token Service: mints and verifies the signed access and refresh tokens.
//!
//! Tokens are HS256 JWTs signed with a single process-wide secret. Nothing is persisted;
//! verification is a pure function of the token, the secret and the injected clock.

use std::{
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    errors::{ConfigError, InvalidToken},
    models::{Identity, Role, TokenPair},
};

/// Longest lifetime either token kind may be given: ten years.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

// --- Clock ---

/// Source of "now" in Unix seconds. Expiry is judged against this clock, so tests can
/// move time across the expiry boundary.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// ManualClock
///
/// A clock that only moves when told to. Used by tests to simulate elapsed time.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_secs() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

// --- Claims ---

/// AccessClaims
///
/// Payload of an access token: who the bearer is and what tier they hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// RefreshClaims
///
/// Payload of a refresh token: the subject only. Unknown fields are rejected so an access
/// token can never be replayed as a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Claims recovered by `TokenService::verify_token`, tagged by token kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenClaims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

impl TokenClaims {
    pub fn subject(&self) -> Uuid {
        match self {
            TokenClaims::Access(c) => c.sub,
            TokenClaims::Refresh(c) => c.sub,
        }
    }
}

// --- Service ---

/// TokenService
///
/// Stateless and shareable across request tasks; the only shared data is the read-only
/// signing key pair.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: i64,
    refresh_ttl: i64,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// new
    ///
    /// Builds the service around a signing secret.
    ///
    /// # Errors
    /// `ConfigError::Missing` when the secret is empty or blank, `ConfigError::Invalid` when
    /// a lifetime is zero or above `MAX_TOKEN_TTL`. Both are fatal at startup.
    pub fn new(
        secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock instead of the library's wall clock.
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl: ttl_secs("ACCESS_TOKEN_TTL_SECS", access_ttl)?,
            refresh_ttl: ttl_secs("REFRESH_TOKEN_TTL_SECS", refresh_ttl)?,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    /// Replaces the clock used for `iat`/`exp` and expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// issue_tokens
    ///
    /// Mints a short-lived access token carrying `{id, email, role}` and a long-lived
    /// refresh token carrying only the subject id.
    pub fn issue_tokens(&self, identity: &Identity) -> Result<TokenPair, jsonwebtoken::errors::Error> {
        let now = self.clock.now();
        let refresh = RefreshClaims {
            sub: identity.id,
            iat: now,
            exp: expiry(now, self.refresh_ttl)?,
        };

        Ok(TokenPair {
            access_token: self.sign_access(identity, now)?,
            refresh_token: encode(&Header::new(Algorithm::HS256), &refresh, &self.encoding)?,
        })
    }

    /// Mints an access token alone. The refresh endpoint uses this so that refresh-token
    /// expiry stays absolute.
    pub fn issue_access(&self, identity: &Identity) -> Result<String, jsonwebtoken::errors::Error> {
        self.sign_access(identity, self.clock.now())
    }

    /// verify_token
    ///
    /// Verifies a token of either kind and returns its claims. Never panics: every
    /// failure comes back as an `InvalidToken`.
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, InvalidToken> {
        match self.verify_access(token) {
            Ok(claims) => Ok(TokenClaims::Access(claims)),
            // A well-signed token that is not access-shaped may still be a refresh token.
            Err(InvalidToken::Malformed) => self.verify_refresh(token).map(TokenClaims::Refresh),
            Err(e) => Err(e),
        }
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, InvalidToken> {
        let claims: AccessClaims = self.decode(token)?;
        self.check_expiry(claims.exp)?;
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, InvalidToken> {
        let claims: RefreshClaims = self.decode(token)?;
        self.check_expiry(claims.exp)?;
        Ok(claims)
    }

    fn sign_access(&self, identity: &Identity, now: i64) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = AccessClaims {
            sub: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            iat: now,
            exp: expiry(now, self.access_ttl)?,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    fn decode<C: DeserializeOwned + Clone>(&self, token: &str) -> Result<C, InvalidToken> {
        decode::<C>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => InvalidToken::BadSignature,
                ErrorKind::ExpiredSignature => InvalidToken::Expired,
                _ => InvalidToken::Malformed,
            })
    }

    // Zero leeway: a token stops verifying the second its lifetime has fully elapsed.
    fn check_expiry(&self, exp: i64) -> Result<(), InvalidToken> {
        if self.clock.now() >= exp {
            Err(InvalidToken::Expired)
        } else {
            Ok(())
        }
    }
}

fn ttl_secs(var: &'static str, ttl: Duration) -> Result<i64, ConfigError> {
    if ttl.is_zero() || ttl > MAX_TOKEN_TTL {
        return Err(ConfigError::Invalid {
            var,
            reason: format!(
                "lifetime must be between 1 and {} seconds",
                MAX_TOKEN_TTL.as_secs()
            ),
        });
    }
    i64::try_from(ttl.as_secs()).map_err(|_| ConfigError::Invalid {
        var,
        reason: "lifetime does not fit a timestamp".to_string(),
    })
}

// An `exp` past the end of the timestamp range cannot be signed.
fn expiry(now: i64, ttl: i64) -> Result<i64, jsonwebtoken::errors::Error> {
    now.checked_add(ttl)
        .ok_or_else(|| ErrorKind::InvalidToken.into())
}
