use std::{env, time::Duration};

use crate::{errors::ConfigError, token::MAX_TOKEN_TTL};

const DEFAULT_ACCESS_TTL_SECS: u64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const LOCAL_SUPABASE_URL: &str = "http://localhost:54321";
const LOCAL_SUPABASE_KEY: &str = "local-service-key";

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and shared
/// through the application state via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which settings have fallbacks.
    pub env: Env,
    // Secret used to sign and verify every access and refresh token.
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    // Backend-as-a-service holding credentials and profiles.
    pub supabase_url: String,
    pub supabase_key: String,
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context: local development or hardened production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            access_token_ttl: Duration::from_secs(DEFAULT_ACCESS_TTL_SECS),
            refresh_token_ttl: Duration::from_secs(DEFAULT_REFRESH_TTL_SECS),
            supabase_url: LOCAL_SUPABASE_URL.to_string(),
            supabase_key: LOCAL_SUPABASE_KEY.to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. The signing secret is mandatory
    /// in every environment; production additionally demands explicit backend settings.
    ///
    /// # Errors
    /// Returns a `ConfigError` for any missing or malformed setting. Callers must treat it
    /// as fatal and refuse to start.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let access_token_ttl = ttl_from_env("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?;
        let refresh_token_ttl = ttl_from_env("REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TTL_SECS)?;
        if refresh_token_ttl <= access_token_ttl {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_TTL_SECS",
                reason: "must be longer than ACCESS_TOKEN_TTL_SECS".to_string(),
            });
        }

        let (supabase_url, supabase_key) = match env {
            Env::Production => (
                env::var("SUPABASE_URL").map_err(|_| ConfigError::Missing("SUPABASE_URL"))?,
                env::var("SUPABASE_KEY").map_err(|_| ConfigError::Missing("SUPABASE_KEY"))?,
            ),
            // Local development points at the Supabase CLI stack by default.
            Env::Local => (
                env::var("SUPABASE_URL").unwrap_or_else(|_| LOCAL_SUPABASE_URL.to_string()),
                env::var("SUPABASE_KEY").unwrap_or_else(|_| LOCAL_SUPABASE_KEY.to_string()),
            ),
        };

        Ok(Self {
            env,
            jwt_secret,
            access_token_ttl,
            refresh_token_ttl,
            supabase_url,
            supabase_key,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        })
    }
}

fn ttl_from_env(var: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    let Ok(raw) = env::var(var) else {
        return Ok(Duration::from_secs(default_secs));
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 && secs <= MAX_TOKEN_TTL.as_secs() => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid {
            var,
            reason: format!(
                "expected between 1 and {} seconds, got '{raw}'",
                MAX_TOKEN_TTL.as_secs()
            ),
        }),
    }
}
