use crate::{auth::AllowedRoles, models::Role};

use super::{
    landing::LandingPages,
    state::{Location, NavState, SessionSource, SessionState},
};

/// GuardState
///
/// Where a protected navigation stands. `Resolving` is left only once the session has
/// settled; the three other states are terminal for the navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Resolving,
    DeniedUnauthenticated,
    DeniedWrongRole,
    Granted,
}

/// Redirect
///
/// A navigation the guard asks the router to perform. Guard redirects always replace the
/// current history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
    pub state: Option<NavState>,
    pub replace: bool,
}

impl Redirect {
    fn replace(to: impl Into<String>, state: Option<NavState>) -> Self {
        Self {
            to: to.into(),
            state,
            replace: true,
        }
    }
}

/// What the view should do right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show the neutral loading indicator; no redirect yet.
    Loading,
    /// Render the guarded content unchanged.
    Render,
    /// Show an access-denied view in place. Used when every landing target is the page
    /// that refused the visitor, so any redirect would come straight back.
    Denied,
    Redirect(Redirect),
}

/// RouteGuard
///
/// Gates a protected view on authentication and, optionally, on a role allow-list.
#[derive(Debug, Clone)]
pub struct RouteGuard<S> {
    session: S,
    required: Option<AllowedRoles>,
    login_path: String,
    landing: LandingPages,
}

impl<S: SessionSource> RouteGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            required: None,
            login_path: "/login".to_string(),
            landing: LandingPages::default(),
        }
    }

    pub fn require_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.required = Some(AllowedRoles::new(roles));
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_landing_pages(mut self, landing: LandingPages) -> Self {
        self.landing = landing;
        self
    }

    pub fn source(&self) -> &S {
        &self.session
    }

    /// Reads the injected session and decides for `location`.
    pub fn evaluate(&self, location: &Location) -> GuardDecision {
        self.decide(&self.session.current(), location)
    }

    pub fn state_for(&self, session: &SessionState) -> GuardState {
        match session {
            SessionState::Loading => GuardState::Resolving,
            SessionState::Anonymous => GuardState::DeniedUnauthenticated,
            SessionState::Authenticated(user) => match &self.required {
                Some(allowed) if !user.role().is_some_and(|r| allowed.permits(r)) => {
                    GuardState::DeniedWrongRole
                }
                _ => GuardState::Granted,
            },
        }
    }

    /// decide
    ///
    /// Pure transition from a session snapshot to a decision.
    pub fn decide(&self, session: &SessionState, location: &Location) -> GuardDecision {
        match self.state_for(session) {
            GuardState::Resolving => GuardDecision::Loading,
            GuardState::Granted => GuardDecision::Render,
            GuardState::DeniedUnauthenticated => {
                tracing::debug!(from = %location.href(), "no session, redirecting to login");
                GuardDecision::Redirect(Redirect::replace(
                    self.login_path.clone(),
                    Some(NavState {
                        from: location.clone(),
                    }),
                ))
            }
            GuardState::DeniedWrongRole => {
                let role = session.user().and_then(|u| u.role());
                // Never bounce a visitor back onto the page that just refused them.
                let target = [self.landing.for_role(role), self.landing.default_path()]
                    .into_iter()
                    .find(|target| *target != location.pathname);

                match target {
                    Some(target) => {
                        tracing::debug!(to = target, "role not permitted, redirecting to landing");
                        GuardDecision::Redirect(Redirect::replace(target, None))
                    }
                    None => {
                        tracing::warn!(
                            path = %location.pathname,
                            "role not permitted and no landing page differs from the current path"
                        );
                        GuardDecision::Denied
                    }
                }
            }
        }
    }
}

/// PublicOnlyGuard
///
/// Guards views meant for signed-out visitors (login, register). Signed-in visitors are
/// sent to the destination carried in the navigation state, or to the default.
#[derive(Debug, Clone)]
pub struct PublicOnlyGuard<S> {
    session: S,
    default_destination: String,
}

impl<S: SessionSource> PublicOnlyGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            default_destination: "/".to_string(),
        }
    }

    pub fn with_default_destination(mut self, path: impl Into<String>) -> Self {
        self.default_destination = path.into();
        self
    }

    pub fn evaluate(&self, carried: Option<&NavState>) -> GuardDecision {
        self.decide(&self.session.current(), carried)
    }

    pub fn decide(&self, session: &SessionState, carried: Option<&NavState>) -> GuardDecision {
        match session {
            SessionState::Loading => GuardDecision::Loading,
            SessionState::Anonymous => GuardDecision::Render,
            SessionState::Authenticated(_) => {
                let to = carried
                    .map(|state| state.from.href())
                    .unwrap_or_else(|| self.default_destination.clone());
                GuardDecision::Redirect(Redirect::replace(to, None))
            }
        }
    }
}
