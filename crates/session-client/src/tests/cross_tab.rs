use super::harness::*;
use crate::SessionState;
use access_gate::Grants;
use credential_store::MemoryCookieJar;
use session_broadcast::{BroadcastBus, LocalBus, SessionBroadcaster, SessionMessage, DEFAULT_CHANNEL};
use std::sync::Arc;
use std::time::Duration;

/// Post `count` sign-in messages from a tab that is not under test.
fn flood(bus: &LocalBus, count: usize) {
    let bus: Arc<dyn BroadcastBus> = Arc::new(bus.clone());
    let stranger = SessionBroadcaster::open(bus, DEFAULT_CHANNEL);
    for _ in 0..count {
        stranger.post(SessionMessage::SignedIn);
    }
}

#[tokio::test]
async fn sign_out_propagates_to_other_tabs() {
    let profile = Profile::new(FakeBackend::with_user(Grants::default()));
    let (tab_a, nav_a) = profile.tab();
    let (tab_b, nav_b) = profile.tab();
    tab_a.mount().await.unwrap();
    tab_a.sign_in(EMAIL, PASSWORD).await.unwrap();
    assert!(tab_b.mount().await.unwrap().is_some());

    let mut watch_b = tab_b.subscribe();
    let mut tap = profile.tap();
    tab_a.sign_out();

    tokio::time::timeout(Duration::from_secs(5), watch_b.changed())
        .await
        .expect("tab B never saw the sign-out")
        .unwrap();
    settle().await;

    assert!(watch_b.borrow().is_none());
    assert_eq!(tab_b.state(), SessionState::Anonymous);
    assert_eq!(tab_b.client().default_token(), None);
    assert_eq!(nav_b.history(), vec!["/"]);
    // B does not echo the sign-out back.
    assert_eq!(nav_a.history(), vec!["/dashboard", "/"]);
    assert_eq!(drain(&mut tap), vec!["signOut"]);
}

#[tokio::test]
async fn sign_out_posted_before_mount_is_applied() {
    let profile = Profile::new(FakeBackend::with_user(Grants::default()));
    profile.seed_credentials();
    let (tab_a, _) = profile.tab();
    let (tab_b, nav_b) = profile.tab();
    tab_b.bootstrap().await.unwrap();

    tab_a.sign_out();
    tab_b.listen().unwrap();
    settle().await;

    assert!(!tab_b.is_authenticated());
    assert_eq!(nav_b.history(), vec!["/"]);
}

#[tokio::test]
async fn sign_in_elsewhere_is_informational() {
    let profile = Profile::new(FakeBackend::with_user(Grants::default()));
    let (tab_a, _) = profile.tab();
    let (tab_b, nav_b) = profile.tab();
    tab_b.mount().await.unwrap();

    tab_a.sign_in(EMAIL, PASSWORD).await.unwrap();
    settle().await;

    assert!(!tab_b.is_authenticated());
    assert_eq!(tab_b.state(), SessionState::Anonymous);
    assert!(nav_b.history().is_empty());
    assert!(profile.backend.requests_to("/me").is_empty());
}

#[tokio::test]
async fn missed_sign_out_is_reconciled_from_the_jar() {
    let profile = Profile {
        backend: FakeBackend::with_user(Grants::default()),
        jar: MemoryCookieJar::new(),
        bus: LocalBus::with_capacity(1),
    };
    profile.seed_credentials();
    let (tab_a, _) = profile.tab();
    let (tab_b, nav_b) = profile.tab();
    tab_b.bootstrap().await.unwrap();
    assert!(tab_b.is_authenticated());

    // The sign-out is pushed out of B's buffer before B reads it.
    tab_a.sign_out();
    flood(&profile.bus, 2);
    tab_b.listen().unwrap();
    settle().await;

    assert!(!tab_b.is_authenticated());
    assert_eq!(nav_b.history(), vec!["/"]);
}

#[tokio::test]
async fn missed_messages_keep_a_live_session() {
    let profile = Profile {
        backend: FakeBackend::with_user(Grants::default()),
        jar: MemoryCookieJar::new(),
        bus: LocalBus::with_capacity(1),
    };
    profile.seed_credentials();
    let (tab_b, nav_b) = profile.tab();
    tab_b.bootstrap().await.unwrap();

    flood(&profile.bus, 3);
    tab_b.listen().unwrap();
    settle().await;

    assert!(tab_b.is_authenticated());
    assert!(nav_b.history().is_empty());
}

#[tokio::test]
async fn dropped_tab_stops_listening() {
    let profile = Profile::new(FakeBackend::with_user(Grants::default()));
    let (tab_a, _) = profile.tab();
    {
        let (tab_b, _) = profile.tab();
        tab_b.mount().await.unwrap();
    }
    settle().await;

    tab_a.sign_out();
    settle().await;
    assert_eq!(profile.bus.receiver_count(DEFAULT_CHANNEL), 1);
}
