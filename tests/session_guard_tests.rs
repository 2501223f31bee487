use marketplace_access::{
    models::Role,
    session::{
        AuthContext, GuardDecision, GuardState, LandingPages, Location, NavState,
        NavigationAction, PublicOnlyGuard, Redirect, RouteGuard, SessionSnapshot, SessionSource,
        SessionState, SessionUser, refresh_on_push, settle,
    },
};
use std::{cell::Cell, time::Duration};
use tokio::sync::{oneshot, watch};

// --- Helper Functions ---

fn signed_in(role: &str) -> SessionState {
    SessionState::Authenticated(SessionUser::new(role))
}

fn snapshot(is_loading: bool, is_authenticated: bool, role: Option<&str>) -> SessionState {
    SessionSnapshot {
        is_authenticated,
        is_loading,
        user: role.map(SessionUser::new),
    }
    .into()
}

fn redirect_to(to: &str) -> GuardDecision {
    GuardDecision::Redirect(Redirect {
        to: to.to_string(),
        state: None,
        replace: true,
    })
}

// --- Session State ---

#[test]
fn test_snapshot_conversion_enforces_user_iff_authenticated() {
    assert_eq!(snapshot(true, true, Some("admin")), SessionState::Loading);
    assert_eq!(snapshot(true, false, None), SessionState::Loading);
    assert_eq!(snapshot(false, false, None), SessionState::Anonymous);
    assert_eq!(snapshot(false, true, Some("vendor")), signed_in("vendor"));
    // Inconsistent snapshots never count as signed in.
    assert_eq!(snapshot(false, true, None), SessionState::Anonymous);
    assert_eq!(snapshot(false, false, Some("admin")), SessionState::Anonymous);
}

#[test]
fn test_snapshot_wire_format() {
    let raw = r#"{"isAuthenticated":true,"isLoading":false,"user":{"role":"vendor"}}"#;
    let parsed: SessionSnapshot = serde_json::from_str(raw).unwrap();
    assert_eq!(SessionState::from(parsed.clone()), signed_in("vendor"));
    assert_eq!(SessionSnapshot::from(&signed_in("vendor")), parsed);
}

#[test]
fn test_failed_resolution_means_signed_out() {
    let failed: Result<Option<SessionUser>, &str> = Err("network down");
    assert_eq!(SessionState::from_resolution(failed), SessionState::Anonymous);

    let ok: Result<Option<SessionUser>, &str> = Ok(Some(SessionUser::new("customer")));
    assert_eq!(SessionState::from_resolution(ok), signed_in("customer"));
}

// --- Landing Pages ---

#[test]
fn test_default_landing_map() {
    let pages = LandingPages::default();
    assert_eq!(pages.for_role(Some(Role::Admin)), "/admin");
    assert_eq!(pages.for_role(Some(Role::Vendor)), "/vendor");
    assert_eq!(pages.for_role(Some(Role::Customer)), "/");
    assert_eq!(pages.for_role(None), "/");
}

#[test]
fn test_custom_landing_map_falls_back_to_default() {
    let pages = LandingPages::new("/shop").with(Role::Admin, "/console");
    assert_eq!(pages.for_role(Some(Role::Vendor)), "/shop");
    assert_eq!(pages.for_role(Some(Role::Admin)), "/console");
}

// --- Route Guard ---

#[test]
fn test_loading_renders_indicator_regardless_of_auth() {
    let location = Location::new("/admin/orders");
    for session in [snapshot(true, false, None), snapshot(true, true, Some("admin"))] {
        let guard = RouteGuard::new(session.clone()).require_roles([Role::Admin]);
        assert_eq!(guard.state_for(&session), GuardState::Resolving);
        assert_eq!(guard.evaluate(&location), GuardDecision::Loading);
    }
}

#[test]
fn test_signed_out_visitor_goes_to_login_with_origin() {
    let location = Location::new("/checkout").with_search("?step=2");
    let guard = RouteGuard::new(SessionState::Anonymous);

    assert_eq!(
        guard.evaluate(&location),
        GuardDecision::Redirect(Redirect {
            to: "/login".to_string(),
            state: Some(NavState {
                from: location.clone()
            }),
            replace: true,
        })
    );
}

#[test]
fn test_custom_login_path() {
    let guard = RouteGuard::new(SessionState::Anonymous).with_login_path("/signin");
    match guard.evaluate(&Location::new("/orders")) {
        GuardDecision::Redirect(redirect) => assert_eq!(redirect.to, "/signin"),
        other => panic!("expected redirect, got {other:?}"),
    }
}

#[test]
fn test_wrong_role_goes_to_role_landing() {
    let location = Location::new("/admin/users");

    let vendor = RouteGuard::new(signed_in("vendor")).require_roles([Role::Admin]);
    assert_eq!(vendor.state_for(&signed_in("vendor")), GuardState::DeniedWrongRole);
    assert_eq!(vendor.evaluate(&location), redirect_to("/vendor"));

    let customer = RouteGuard::new(signed_in("customer")).require_roles([Role::Admin]);
    assert_eq!(customer.evaluate(&location), redirect_to("/"));

    let admin = RouteGuard::new(signed_in("admin")).require_roles([Role::Vendor]);
    assert_eq!(admin.evaluate(&Location::new("/vendor/stock")), redirect_to("/admin"));
}

#[test]
fn test_unrecognized_role_goes_to_default_landing() {
    let guard = RouteGuard::new(signed_in("superuser")).require_roles([Role::Admin]);
    assert_eq!(guard.evaluate(&Location::new("/admin")), redirect_to("/"));
}

#[test]
fn test_wrong_role_redirect_never_targets_current_page() {
    // A vendor refused on "/vendor" itself must not be sent back to "/vendor".
    let guard = RouteGuard::new(signed_in("vendor")).require_roles([Role::Admin]);
    assert_eq!(guard.evaluate(&Location::new("/vendor")), redirect_to("/"));
}

#[test]
fn test_refusal_on_default_landing_is_shown_in_place() {
    // "/" is both the customer landing and the default, and it is the page refusing them.
    let guard = RouteGuard::new(signed_in("customer")).require_roles([Role::Admin]);
    assert_eq!(guard.evaluate(&Location::new("/")), GuardDecision::Denied);

    let pages = LandingPages::new("/vendor").with(Role::Vendor, "/vendor");
    let vendor = RouteGuard::new(signed_in("vendor"))
        .require_roles([Role::Admin])
        .with_landing_pages(pages);
    assert_eq!(vendor.evaluate(&Location::new("/vendor")), GuardDecision::Denied);
    assert_eq!(vendor.evaluate(&Location::new("/admin")), redirect_to("/vendor"));
}

#[test]
fn test_satisfied_role_renders_content() {
    let location = Location::new("/admin");
    let guard = RouteGuard::new(signed_in("admin")).require_roles([Role::Admin, Role::Vendor]);
    assert_eq!(guard.state_for(&signed_in("admin")), GuardState::Granted);
    assert_eq!(guard.evaluate(&location), GuardDecision::Render);

    let open = RouteGuard::new(signed_in("customer"));
    assert_eq!(open.evaluate(&Location::new("/orders")), GuardDecision::Render);
}

#[test]
fn test_guard_reads_live_session_source() {
    let (tx, rx) = watch::channel(SessionState::Loading);
    let guard = RouteGuard::new(rx).require_roles([Role::Vendor]);
    let location = Location::new("/vendor/stock");

    assert_eq!(guard.evaluate(&location), GuardDecision::Loading);
    tx.send(signed_in("vendor")).unwrap();
    assert_eq!(guard.evaluate(&location), GuardDecision::Render);
    tx.send(SessionState::Anonymous).unwrap();
    assert!(matches!(guard.evaluate(&location), GuardDecision::Redirect(_)));
}

// --- Public-Only Guard ---

#[test]
fn test_public_guard_returns_visitor_to_carried_origin() {
    let guard = PublicOnlyGuard::new(signed_in("customer"));
    let carried = NavState {
        from: Location::new("/checkout"),
    };
    assert_eq!(guard.evaluate(Some(&carried)), redirect_to("/checkout"));
}

#[test]
fn test_public_guard_defaults_without_origin() {
    let guard = PublicOnlyGuard::new(signed_in("customer"));
    assert_eq!(guard.evaluate(None), redirect_to("/"));

    let custom = PublicOnlyGuard::new(signed_in("vendor")).with_default_destination("/dashboard");
    assert_eq!(custom.evaluate(None), redirect_to("/dashboard"));
}

#[test]
fn test_public_guard_renders_for_signed_out_visitor() {
    assert_eq!(
        PublicOnlyGuard::new(SessionState::Anonymous).evaluate(None),
        GuardDecision::Render
    );
    assert_eq!(
        PublicOnlyGuard::new(SessionState::Loading).evaluate(None),
        GuardDecision::Loading
    );
}

#[test]
fn test_login_round_trip_preserves_query() {
    let origin = Location::new("/checkout").with_search("?cart=9");
    let protected = RouteGuard::new(SessionState::Anonymous);
    let GuardDecision::Redirect(to_login) = protected.evaluate(&origin) else {
        panic!("expected redirect to login");
    };

    let public = PublicOnlyGuard::new(signed_in("customer"));
    assert_eq!(
        public.evaluate(to_login.state.as_ref()),
        redirect_to("/checkout?cart=9")
    );
}

// --- Async Resolution ---

#[tokio::test]
async fn test_settle_waits_for_resolution_and_uses_newest_state() {
    let (tx, rx) = watch::channel(SessionState::Loading);
    let guard = RouteGuard::new(rx).require_roles([Role::Admin]);
    let location = Location::new("/admin");

    let pending = tokio::spawn(async move {
        settle(&guard, &location, std::future::pending::<()>()).await
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!pending.is_finished());

    tx.send(SessionState::Loading).unwrap();
    tx.send(signed_in("admin")).unwrap();

    assert_eq!(pending.await.unwrap(), Some(GuardDecision::Render));
}

#[tokio::test]
async fn test_settle_on_already_resolved_session() {
    let (_tx, rx) = watch::channel(signed_in("vendor"));
    let guard = RouteGuard::new(rx).require_roles([Role::Admin]);

    let decision = settle(&guard, &Location::new("/admin"), std::future::pending::<()>()).await;
    assert_eq!(decision, Some(redirect_to("/vendor")));
}

#[tokio::test]
async fn test_settle_after_unmount_does_nothing() {
    let (tx, rx) = watch::channel(SessionState::Loading);
    let guard = RouteGuard::new(rx);
    let (unmount, unmounted) = oneshot::channel::<()>();

    let pending = tokio::spawn(async move {
        settle(&guard, &Location::new("/orders"), unmounted).await
    });

    unmount.send(()).unwrap();
    assert_eq!(pending.await.unwrap(), None);

    // A late resolution has nobody left to act on it.
    let _ = tx.send(signed_in("customer"));
}

#[tokio::test]
async fn test_settle_when_provider_disappears_is_signed_out() {
    let (tx, rx) = watch::channel(SessionState::Loading);
    let guard = RouteGuard::new(rx);
    drop(tx);

    let decision = settle(&guard, &Location::new("/orders"), std::future::pending::<()>()).await;
    assert!(matches!(
        decision,
        Some(GuardDecision::Redirect(Redirect { ref to, .. })) if to == "/login"
    ));
}

// --- Navigation Refresh ---

struct CountingContext {
    state: SessionState,
    refreshes: Cell<u32>,
}

impl SessionSource for CountingContext {
    fn current(&self) -> SessionState {
        self.state.clone()
    }
}

impl AuthContext for CountingContext {
    fn refresh_user(&self) {
        self.refreshes.set(self.refreshes.get() + 1);
    }
}

#[test]
fn test_refresh_only_on_push_while_signed_in() {
    let ctx = CountingContext {
        state: signed_in("vendor"),
        refreshes: Cell::new(0),
    };

    assert!(refresh_on_push(NavigationAction::Push, &ctx));
    assert!(!refresh_on_push(NavigationAction::Pop, &ctx));
    assert!(!refresh_on_push(NavigationAction::Replace, &ctx));
    assert_eq!(ctx.refreshes.get(), 1);

    let anonymous = CountingContext {
        state: SessionState::Anonymous,
        refreshes: Cell::new(0),
    };
    assert!(!refresh_on_push(NavigationAction::Push, &anonymous));
    assert_eq!(anonymous.refreshes.get(), 0);
}
