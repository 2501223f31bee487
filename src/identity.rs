use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::{
    errors::StoreError,
    models::{Identity, Role},
};

// 1. IdentityStore Contract
/// IdentityStore
///
/// The external identity store as seen by the access-control layer. Credential checks and
/// profile storage live in the backend-as-a-service; this crate only reads from it.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Checks an email/password pair. `Ok(None)` means the credentials were rejected.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, StoreError>;

    /// Loads the current identity record for a subject id.
    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, StoreError>;
}

/// IdentityState
///
/// The concrete type used to share the identity store across the application state.
pub type IdentityState = Arc<dyn IdentityStore>;

// 2. The Real Implementation (Supabase)
/// SupabaseIdentityStore
///
/// Talks to Supabase over REST: the GoTrue password grant for credentials and the
/// `profiles` table (via PostgREST) for the role.
#[derive(Clone)]
pub struct SupabaseIdentityStore {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Deserialize)]
struct PasswordGrantResponse {
    user: GrantUser,
}

#[derive(Deserialize)]
struct GrantUser {
    id: Uuid,
}

/// A row of `public.profiles`. The role column may be null on freshly created accounts.
#[derive(Deserialize)]
struct ProfileRow {
    id: Uuid,
    email: String,
    #[serde(default, deserialize_with = "lenient_role")]
    role: Option<Role>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Reads the role column without failing the whole row: values this service does not
/// know fall back to the default role.
fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.parse::<Role>() {
        Ok(role) => Some(role),
        Err(e) => {
            tracing::warn!(error = %e, "unrecognized profile role, using default");
            None
        }
    }))
}

impl From<ProfileRow> for Identity {
    fn from(row: ProfileRow) -> Self {
        Identity {
            id: row.id,
            email: row.email,
            role: row.role.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl SupabaseIdentityStore {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityStore for SupabaseIdentityStore {
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token?grant_type=password", self.base_url))
            .header("apikey", &self.service_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            // GoTrue answers 400 for a wrong password and for unknown users alike.
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => return Ok(None),
            status if !status.is_success() => {
                return Err(StoreError::UnexpectedStatus(status.as_u16()));
            }
            _ => {}
        }

        let grant = response.json::<PasswordGrantResponse>().await?;
        self.find_identity(grant.user.id).await
    }

    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        let response = self
            .client
            .get(format!("{}/rest/v1/profiles", self.base_url))
            .query(&[
                ("id", format!("eq.{id}")),
                ("select", "id,email,role,created_at,updated_at".to_string()),
            ])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::UnexpectedStatus(response.status().as_u16()));
        }

        let rows = response.json::<Vec<ProfileRow>>().await?;
        Ok(rows.into_iter().next().map(Identity::from))
    }
}

// 3. The In-Memory Implementation (For Tests)
/// InMemoryIdentityStore
///
/// Holds identities and their passwords in a map. Used by the integration tests to drive
/// login and refresh without a network connection.
#[derive(Clone, Default)]
pub struct InMemoryIdentityStore {
    accounts: HashMap<String, (String, Identity)>,
    /// When true, every call fails as if the backend were unreachable.
    pub should_fail: bool,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn with_identity(mut self, identity: Identity, password: &str) -> Self {
        self.accounts
            .insert(identity.email.clone(), (password.to_string(), identity));
        self
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, StoreError> {
        if self.should_fail {
            return Err(StoreError::UnexpectedStatus(503));
        }
        Ok(self
            .accounts
            .get(email)
            .filter(|(stored, _)| stored == password)
            .map(|(_, identity)| identity.clone()))
    }

    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        if self.should_fail {
            return Err(StoreError::UnexpectedStatus(503));
        }
        Ok(self
            .accounts
            .values()
            .find(|(_, identity)| identity.id == id)
            .map(|(_, identity)| identity.clone()))
    }
}
