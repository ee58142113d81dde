//! End-to-end session lifecycle scenarios against the public API.

use bridge_traits::time::ManualClock;
use chrono::Duration as ChronoDuration;
use core_auth::{
    AuthError, AuthManager, ExpiryReason, Identity, IdentityProfile, SessionStore,
    StaticIdentityResolver,
};
use core_runtime::config::SessionConfig;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus, EventStream};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn config(lifetime: Duration, inactivity: Duration) -> SessionConfig {
    SessionConfig::builder()
        .session_lifetime(lifetime)
        .inactivity_timeout(inactivity)
        .build()
        .unwrap()
}

fn identity() -> Identity {
    Identity::new("google", "google_user_123", "user@google.com", "Google User")
}

fn store(config: &SessionConfig) -> (Arc<SessionStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let store = SessionStore::new(config, clock.clone()).unwrap();
    (Arc::new(store), clock)
}

#[tokio::test]
async fn idle_session_expires_then_disappears() {
    let (store, clock) = store(&config(
        Duration::from_secs(24 * 3600),
        Duration::from_secs(30 * 60),
    ));
    let token = store.issue(identity()).await.unwrap();

    clock.advance(ChronoDuration::minutes(10));
    assert_eq!(store.validate(token.as_str()).await.unwrap().id, "google_user_123");

    // 35 minutes idle since the last validation
    clock.advance(ChronoDuration::minutes(35));
    assert_eq!(
        store.validate(token.as_str()).await.unwrap_err(),
        AuthError::Expired {
            reason: ExpiryReason::Inactivity
        }
    );
    assert_eq!(
        store.validate(token.as_str()).await.unwrap_err(),
        AuthError::NotFound
    );
}

#[tokio::test]
async fn active_session_still_hits_absolute_deadline() {
    let (store, clock) = store(&config(
        Duration::from_secs(3600),
        Duration::from_secs(30 * 60),
    ));
    let token = store.issue(identity()).await.unwrap();

    for _ in 0..3 {
        clock.advance(ChronoDuration::minutes(20));
        assert!(store.validate(token.as_str()).await.is_ok());
    }

    // Now exactly T0+1h, still valid; one second later it is not.
    clock.advance(ChronoDuration::seconds(1));
    assert_eq!(
        store.validate(token.as_str()).await.unwrap_err(),
        AuthError::Expired {
            reason: ExpiryReason::Absolute
        }
    );
}

#[tokio::test]
async fn rotation_resets_both_deadlines() {
    let (store, clock) = store(&config(
        Duration::from_secs(3600),
        Duration::from_secs(30 * 60),
    ));
    let old = store.issue(identity()).await.unwrap();

    clock.advance(ChronoDuration::minutes(25));
    let new = store.rotate(old.as_str()).await.unwrap();

    clock.advance(ChronoDuration::minutes(29));
    assert!(store.validate(new.as_str()).await.is_ok());
    clock.advance(ChronoDuration::minutes(29));
    // T0+83m, past the first deadline but inside the rotated one
    assert!(store.validate(new.as_str()).await.is_ok());
    assert_eq!(
        store.validate(old.as_str()).await.unwrap_err(),
        AuthError::NotFound
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_issue_yields_unique_tokens() {
    let (store, _clock) = store(&SessionConfig::default());

    let handles: Vec<_> = (0..64)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.issue(identity()).await.unwrap() })
        })
        .collect();

    let mut tokens = HashSet::new();
    for handle in handles {
        tokens.insert(handle.await.unwrap());
    }

    assert_eq!(tokens.len(), 64);
    assert_eq!(store.len().await, 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rotation_has_single_winner() {
    let (store, _clock) = store(&SessionConfig::default());
    let token = store.issue(identity()).await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&store);
            let token = token.clone();
            tokio::spawn(async move { store.rotate(token.as_str()).await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(err) => assert_eq!(err, AuthError::NotFound),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn validate_racing_invalidate_never_resurrects() {
    let (store, _clock) = store(&SessionConfig::default());
    let token = store.issue(identity()).await.unwrap();

    let validators: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&store);
            let token = token.clone();
            tokio::spawn(async move { store.validate(token.as_str()).await })
        })
        .collect();
    let invalidated = store.invalidate(token.as_str()).await;

    for handle in validators {
        match handle.await.unwrap() {
            Ok(identity) => assert_eq!(identity.id, "google_user_123"),
            Err(err) => assert_eq!(err, AuthError::NotFound),
        }
    }

    assert!(invalidated);
    assert_eq!(
        store.validate(token.as_str()).await.unwrap_err(),
        AuthError::NotFound
    );
}

#[tokio::test]
async fn manager_login_flow_with_static_resolver() {
    let config = SessionConfig::default();
    let resolver = StaticIdentityResolver::new(&config.allowed_providers)
        .with_identity(
            "github",
            "gh-code",
            IdentityProfile::new("github_user_123", "user@github.com", "Github User"),
        )
        .with_fallback_profiles(false);

    let clock = Arc::new(ManualClock::default());
    let event_bus = EventBus::new(16);
    let mut signed_out = EventStream::new(event_bus.subscribe())
        .filter(|event| matches!(event, CoreEvent::Auth(AuthEvent::SignedOut { .. })));

    let manager = AuthManager::new(config, Arc::new(resolver), clock.clone(), event_bus).unwrap();

    assert_eq!(
        manager.login("github", "wrong").await.unwrap_err(),
        AuthError::InvalidCode
    );

    let token = manager.login("GITHUB", "gh-code").await.unwrap();
    let identity = manager.validate(token.as_str()).await.unwrap();
    assert_eq!(identity.provider, "github");
    assert_eq!(identity.display_name, "Github User");

    let rotated = manager.rotate(token.as_str()).await.unwrap();
    assert!(manager.logout(rotated.as_str()).await);

    assert_eq!(
        signed_out.try_recv().unwrap().unwrap(),
        CoreEvent::Auth(AuthEvent::SignedOut {
            user_id: "github_user_123".to_string()
        })
    );
}

#[tokio::test]
async fn errors_never_echo_tokens() {
    let (store, clock) = store(&SessionConfig::default());
    let token = store.issue(identity()).await.unwrap();

    clock.advance(ChronoDuration::hours(2));
    let err = store.validate(token.as_str()).await.unwrap_err();
    assert!(!err.to_string().contains(token.as_str()));
    assert!(!format!("{:?}", err).contains(token.as_str()));
}
