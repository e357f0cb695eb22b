use super::harness::*;
use crate::{SessionError, SessionState, User};
use access_gate::{authorize, can, AuthorizationGate, AuthorizationRequirement, Grants};
use parking_lot::Mutex;
use std::sync::Arc;

fn analyst() -> Grants {
    Grants::new(["metrics.list"], ["analyst"])
}

#[tokio::test]
async fn sign_in_populates_session() {
    let profile = Profile::new(FakeBackend::with_user(analyst()));
    let (tab, navigator) = profile.tab();
    let mut tap = profile.tap();

    let user = tab.sign_in(EMAIL, PASSWORD).await.unwrap();

    assert_eq!(
        user,
        User {
            email: EMAIL.to_string(),
            grants: analyst(),
        }
    );
    assert_eq!(tab.user(), Some(user));
    assert!(tab.is_authenticated());
    assert_eq!(tab.state(), SessionState::Authenticated);

    let stored = profile.store().get().unwrap();
    assert_eq!(stored.access_token, tab.client().default_token());
    assert!(stored.refresh_token.is_some());

    assert_eq!(navigator.current().as_deref(), Some("/dashboard"));
    assert_eq!(drain(&mut tap), vec!["signIn"]);
}

#[tokio::test]
async fn failed_sign_in_leaves_no_partial_session() {
    let profile = Profile::new(FakeBackend::with_user(analyst()));
    let (tab, navigator) = profile.tab();
    let mut tap = profile.tap();

    let err = tab.sign_in(EMAIL, "wrong").await.unwrap_err();
    assert!(matches!(err, SessionError::Client(_)));

    assert_eq!(tab.user(), None);
    assert_eq!(tab.state(), SessionState::Anonymous);
    assert_eq!(profile.store().get().unwrap(), Default::default());
    assert_eq!(navigator.history(), vec!["/"]);
    assert_eq!(drain(&mut tap), vec!["signOut"]);
}

#[tokio::test]
async fn sign_in_is_not_intercepted() {
    let profile = Profile::new(FakeBackend::with_user(analyst()));
    let (tab, _) = profile.tab();

    let _ = tab.sign_in(EMAIL, "wrong").await;
    let attempts = profile.backend.requests_to("/sessions");
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].bearer, None);
    assert_eq!(profile.backend.refresh_calls(), 0);
}

#[tokio::test]
async fn sign_out_clears_everything() {
    let profile = Profile::new(FakeBackend::with_user(analyst()));
    let (tab, navigator) = profile.tab();
    tab.sign_in(EMAIL, PASSWORD).await.unwrap();
    let mut tap = profile.tap();

    tab.sign_out();

    assert_eq!(tab.user(), None);
    assert_eq!(tab.client().default_token(), None);
    assert_eq!(profile.store().get().unwrap(), Default::default());
    assert_eq!(navigator.history(), vec!["/dashboard", "/"]);
    assert_eq!(drain(&mut tap), vec!["signOut"]);
}

#[tokio::test]
async fn bootstrap_without_token_is_silent() {
    let profile = Profile::new(FakeBackend::with_user(analyst()));
    let (tab, navigator) = profile.tab();

    assert_eq!(tab.mount().await.unwrap(), None);
    assert!(profile.backend.requests().is_empty());
    assert!(navigator.history().is_empty());
    assert_eq!(tab.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn bootstrap_restores_session_from_stored_token() {
    let profile = Profile::new(FakeBackend::with_user(analyst()));
    profile.seed_credentials();
    let (tab, navigator) = profile.tab();

    let user = tab.mount().await.unwrap().unwrap();
    assert_eq!(user.grants, analyst());
    assert_eq!(tab.state(), SessionState::Authenticated);
    assert_eq!(profile.backend.requests_to("/me").len(), 1);
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn bootstrap_with_rejected_token_signs_out_once() {
    let profile = Profile::new(FakeBackend::with_user(analyst()));
    let token = profile.seed_credentials();
    profile.backend.revoke(&token);
    let (tab, navigator) = profile.tab();
    let mut tap = profile.tap();

    assert!(tab.mount().await.is_err());
    assert_eq!(tab.user(), None);
    assert_eq!(tab.state(), SessionState::Anonymous);
    assert_eq!(navigator.history(), vec!["/"]);
    assert_eq!(drain(&mut tap), vec!["signOut"]);
    assert!(!profile.store().has_access_token().unwrap());
}

#[tokio::test]
async fn bootstrap_with_expired_token_refreshes() {
    let profile = Profile::new(FakeBackend::with_user(analyst()));
    let token = profile.seed_credentials();
    profile.backend.expire(&token);
    let (tab, _) = profile.tab();

    assert!(tab.mount().await.unwrap().is_some());
    assert_eq!(profile.backend.refresh_calls(), 1);
    assert_ne!(tab.client().default_token(), Some(token));
}

#[tokio::test]
async fn gate_follows_session_changes() {
    let profile = Profile::new(FakeBackend::with_user(analyst()));
    let (tab, _) = profile.tab();
    let gate = AuthorizationGate::new(AuthorizationRequirement::none());
    let mut watcher = tab.subscribe();

    assert_eq!(gate.render(&tab, || "chart"), None);

    tab.sign_in(EMAIL, PASSWORD).await.unwrap();
    assert!(watcher.has_changed().unwrap());
    assert!(watcher.borrow_and_update().is_some());
    assert_eq!(gate.render(&tab, || "chart"), Some("chart"));

    tab.sign_out();
    assert!(watcher.has_changed().unwrap());
    assert_eq!(gate.render(&tab, || "chart"), None);
}

#[tokio::test]
async fn metrics_create_is_denied_to_list_only_user() {
    let profile = Profile::new(FakeBackend::with_user(analyst()));
    let (tab, _) = profile.tab();
    tab.sign_in(EMAIL, PASSWORD).await.unwrap();

    let requirement = AuthorizationRequirement::permissions(["metrics.list", "metrics.create"]);
    assert!(!authorize(tab.user().map(|u| u.grants).as_ref(), &requirement));
    assert!(!can(&tab, &requirement));
    assert!(can(&tab, &AuthorizationRequirement::permissions(["metrics.list"])));
    assert!(can(&tab, &AuthorizationRequirement::roles(["admin", "analyst"])));
}

#[tokio::test]
async fn state_callback_sees_transitions() {
    let profile = Profile::new(FakeBackend::with_user(analyst()));
    let (tab, _) = profile.tab();
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = seen.clone();
        tab.set_state_callback(Box::new(move |state: SessionState, user: Option<&User>| {
            seen.lock().push((state, user.map(|u| u.email.clone())));
        }));
    }

    tab.sign_in(EMAIL, PASSWORD).await.unwrap();
    tab.sign_out();

    assert_eq!(
        *seen.lock(),
        vec![
            (SessionState::Authenticated, Some(EMAIL.to_string())),
            (SessionState::Anonymous, None),
        ]
    );
}
