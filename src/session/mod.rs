//! Session Guard: client-side route gating.
//!
//! The guards decide, from the current `SessionState`, whether a view renders, waits
//! on a loading indicator, or redirects. They never own session state: it is read
//! through a `SessionSource` handed to them, so each guard can be exercised in isolation.

mod guard;
mod landing;
mod resolve;
mod state;

pub use guard::{GuardDecision, GuardState, PublicOnlyGuard, Redirect, RouteGuard};
pub use landing::LandingPages;
pub use resolve::{NavigationAction, refresh_on_push, settle};
pub use state::{
    AuthContext, Location, NavState, SessionSnapshot, SessionSource, SessionState, SessionUser,
};
