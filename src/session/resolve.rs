use std::future::Future;

use tokio::sync::watch;

use super::{
    guard::{GuardDecision, RouteGuard},
    state::{AuthContext, Location, SessionState},
};

/// settle
///
/// Waits for the session behind `guard` to finish resolving, then decides for `location`.
///
/// The decision is always taken against the newest state on the channel, however many
/// updates arrived while resolving. If `unmounted` completes first the navigation is
/// abandoned and `None` is returned: nothing renders and nothing redirects. A provider
/// that goes away mid-resolution counts as signed out.
pub async fn settle<U>(
    guard: &RouteGuard<watch::Receiver<SessionState>>,
    location: &Location,
    unmounted: U,
) -> Option<GuardDecision>
where
    U: Future,
{
    let mut session = guard.source().clone();

    tokio::select! {
        biased;

        _ = unmounted => None,
        resolved = session.wait_for(|state| !state.is_loading()) => Some(match resolved {
            Ok(state) => guard.decide(&state, location),
            Err(_) => guard.decide(&SessionState::Anonymous, location),
        }),
    }
}

/// How the visitor arrived at the current location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAction {
    Push,
    Pop,
    Replace,
}

/// refresh_on_push
///
/// Asks the auth context to refresh the user on forward navigations while signed in, so
/// role changes reach the guards without a reload. Returns whether a refresh was requested.
pub fn refresh_on_push<C: AuthContext + ?Sized>(action: NavigationAction, ctx: &C) -> bool {
    if action == NavigationAction::Push && ctx.current().is_authenticated() {
        ctx.refresh_user();
        return true;
    }
    false
}
