use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use ts_rs::TS;

use crate::models::Role;

/// SessionUser
///
/// The identity projection the client keeps. The role is held as the raw string the
/// auth context reported; unrecognized values simply match no role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionUser {
    pub role: String,
}

impl SessionUser {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }

    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

/// SessionState
///
/// The client's derived view of authentication status. A user is present exactly when
/// the session is authenticated, and that pairing is enforced by the shape of the enum.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Initial resolution is still in flight.
    #[default]
    Loading,
    Anonymous,
    Authenticated(SessionUser),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Folds the outcome of a session lookup into a settled state. A failed lookup means
    /// "not authenticated", never "unknown".
    pub fn from_resolution<E>(result: Result<Option<SessionUser>, E>) -> Self {
        match result {
            Ok(Some(user)) => SessionState::Authenticated(user),
            Ok(None) | Err(_) => SessionState::Anonymous,
        }
    }
}

/// SessionSnapshot
///
/// Wire form of the auth context (`{isAuthenticated, isLoading, user}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<SessionUser>,
}

impl From<SessionSnapshot> for SessionState {
    fn from(snapshot: SessionSnapshot) -> Self {
        if snapshot.is_loading {
            return SessionState::Loading;
        }
        match (snapshot.is_authenticated, snapshot.user) {
            (true, Some(user)) => SessionState::Authenticated(user),
            // Inconsistent snapshots are treated as signed out.
            _ => SessionState::Anonymous,
        }
    }
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        Self {
            is_authenticated: state.is_authenticated(),
            is_loading: state.is_loading(),
            user: state.user().cloned(),
        }
    }
}

/// Location
///
/// A client-side location, as the router reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Location {
    pub pathname: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub hash: String,
}

impl Location {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Path, query and fragment joined back into a navigable target.
    pub fn href(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// NavState
///
/// Navigation state attached to a login redirect, so the login flow can send the visitor
/// back where they were headed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NavState {
    pub from: Location,
}

/// SessionSource
///
/// Accessor for the current session state, injected into the guards.
pub trait SessionSource {
    fn current(&self) -> SessionState;
}

impl SessionSource for SessionState {
    fn current(&self) -> SessionState {
        self.clone()
    }
}

impl SessionSource for watch::Receiver<SessionState> {
    fn current(&self) -> SessionState {
        self.borrow().clone()
    }
}

impl<T: SessionSource + ?Sized> SessionSource for &T {
    fn current(&self) -> SessionState {
        (**self).current()
    }
}

impl<T: SessionSource + ?Sized> SessionSource for Arc<T> {
    fn current(&self) -> SessionState {
        (**self).current()
    }
}

/// AuthContext
///
/// The external session provider. Refreshing is its job; guards only read the result.
pub trait AuthContext: SessionSource {
    fn refresh_user(&self);
}
