//! Session manager behaviour against the in-memory stores.

use std::sync::Arc;

use carelog_auth::memory::{MemoryIdentityStore, MemoryUserStore};
use carelog_auth::{AuthDecision, AuthError, AuthErrorKind, SessionManager, evaluate};
use carelog_core::session::SessionStatus;
use carelog_core::{Role, Route, SessionState, UserRecord};
use chrono::{TimeDelta, Utc};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

struct Harness {
    identity: Arc<MemoryIdentityStore>,
    users: Arc<MemoryUserStore>,
    manager: Arc<SessionManager>,
}

fn record(id: &str, role: Role) -> UserRecord {
    UserRecord {
        id: id.into(),
        staff_number: id.into(),
        name: format!("Staff {id}"),
        role,
        created_at: Utc::now(),
    }
}

/// Staff 1001 and admin 1002, both with password `correct-pw`.
fn harness() -> Harness {
    let identity = Arc::new(
        MemoryIdentityStore::new()
            .with_account("1001", "1001", "correct-pw")
            .with_account("1002", "1002", "correct-pw"),
    );
    let users = Arc::new(
        MemoryUserStore::new()
            .with_record(record("1001", Role::Staff))
            .with_record(record("1002", Role::Admin)),
    );
    let manager = Arc::new(SessionManager::new(
        Arc::clone(&identity) as _,
        Arc::clone(&users) as _,
    ));
    Harness {
        identity,
        users,
        manager,
    }
}

fn assert_no_partial_auth(manager: &SessionManager) {
    assert_eq!(
        manager.has_token(),
        manager.state().is_logged_in(),
        "token held without a resolved role (or vice versa)"
    );
}

async fn settle(manager: &SessionManager, status: SessionStatus) {
    for _ in 0..100 {
        if manager.state().status() == status {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("session never reached {status}, stuck at {}", manager.state().status());
}

// --- restore ---

#[tokio::test]
async fn restore_without_token_goes_pending_then_logged_out() {
    let h = harness();

    assert!(h.manager.pending());
    assert_eq!(evaluate(&h.manager.state(), None), AuthDecision::Pending);

    let state = h.manager.restore().await;

    assert_eq!(state, SessionState::LoggedOut);
    assert!(!h.manager.pending());
    assert_eq!(evaluate(&state, None), AuthDecision::RedirectToLogin);
    assert_eq!(h.manager.last_error(), None);
}

#[tokio::test]
async fn restore_resolves_stored_token() {
    let h = harness();
    let token = h.identity.mint("1002", Some(Utc::now() + TimeDelta::hours(1)));
    h.identity.set_active(Some(token));

    let state = h.manager.restore().await;

    assert!(state.is_admin());
    assert!(h.manager.has_token());
}

#[tokio::test]
async fn restore_with_missing_record_is_logged_out_with_error() {
    let h = harness();
    h.identity.set_active(Some(h.identity.mint("ghost", None)));

    let state = h.manager.restore().await;

    assert_eq!(state, SessionState::LoggedOut);
    let error = h.manager.last_error().expect("error recorded");
    assert_eq!(error.kind(), AuthErrorKind::UserRecordMissing);
    assert_no_partial_auth(&h.manager);
}

#[tokio::test]
async fn restore_treats_expired_token_as_absent() {
    let h = harness();
    let token = h.identity.mint("1001", Some(Utc::now() + TimeDelta::seconds(10)));
    h.identity.set_active(Some(token));

    let state = h.manager.restore().await;

    assert_eq!(state, SessionState::LoggedOut);
    assert_eq!(h.manager.last_error(), None);
}

#[tokio::test]
async fn restore_with_unreachable_store_degrades_to_logged_out() {
    let h = harness();
    h.identity.set_unavailable(true);

    let state = h.manager.restore().await;

    assert_eq!(state, SessionState::LoggedOut);
    assert_eq!(
        h.manager.last_error().map(|e| e.kind()),
        Some(AuthErrorKind::NetworkUnavailable)
    );
}

// --- sign in ---

#[tokio::test]
async fn staff_sign_in_is_redirected_home_from_admin_pages() {
    let h = harness();
    h.manager.restore().await;

    let signed_in = h.manager.sign_in("1001", "correct-pw").await.expect("sign in");

    assert_eq!(signed_in.session.role, Role::Staff);
    assert_eq!(signed_in.navigate_to, Route::Dashboard);
    let state = h.manager.state();
    assert_eq!(state.role(), Some(Role::Staff));
    assert_eq!(evaluate(&state, Some(Role::Admin)), AuthDecision::RedirectToHome);
    assert_eq!(evaluate(&state, None), AuthDecision::Allow);
}

#[tokio::test]
async fn admin_sign_in_is_allowed_on_admin_pages() {
    let h = harness();
    h.manager.restore().await;

    h.manager.sign_in("1002", "correct-pw").await.expect("sign in");

    assert!(h.manager.is_admin());
    assert_eq!(
        evaluate(&h.manager.state(), Some(Role::Admin)),
        AuthDecision::Allow
    );
}

#[tokio::test]
async fn wrong_password_keeps_logged_out() {
    let h = harness();
    h.manager.restore().await;

    let result = h.manager.sign_in("1001", "wrong").await;

    assert_eq!(result, Err(AuthError::InvalidCredentials));
    assert_eq!(h.manager.state(), SessionState::LoggedOut);
    assert_eq!(h.manager.last_error(), Some(AuthError::InvalidCredentials));
}

#[tokio::test]
async fn blank_credentials_never_reach_the_store() {
    let h = harness();
    h.identity.set_unavailable(true);

    assert_eq!(
        h.manager.sign_in("   ", "correct-pw").await,
        Err(AuthError::InvalidCredentials)
    );
    assert_eq!(
        h.manager.sign_in("1001", "").await,
        Err(AuthError::InvalidCredentials)
    );
}

#[tokio::test]
async fn sign_in_before_restore_settles_unknown_on_failure() {
    let h = harness();

    let result = h.manager.sign_in("1001", "wrong").await;

    assert!(result.is_err());
    assert_eq!(h.manager.state(), SessionState::LoggedOut);
    assert!(!h.manager.pending());
}

#[tokio::test]
async fn sign_in_without_staff_record_revokes_token() {
    let h = harness();
    h.manager.restore().await;
    h.users.remove("1001");

    let result = h.manager.sign_in("1001", "correct-pw").await;

    assert_eq!(
        result.map_err(|e| e.kind()),
        Err(AuthErrorKind::UserRecordMissing)
    );
    assert_eq!(h.manager.state(), SessionState::LoggedOut);
    assert!(h.identity.active().is_none());
    assert_eq!(h.identity.revoked().len(), 1);
    assert_no_partial_auth(&h.manager);
}

#[tokio::test]
async fn failed_sign_in_keeps_existing_session() {
    let h = harness();
    h.manager.restore().await;
    h.manager.sign_in("1002", "correct-pw").await.expect("sign in");

    let result = h.manager.sign_in("1001", "wrong").await;

    assert_eq!(result, Err(AuthError::InvalidCredentials));
    assert!(h.manager.is_admin());
    assert_no_partial_auth(&h.manager);
}

#[tokio::test]
async fn stale_sign_in_does_not_overwrite_newer_one() {
    let h = harness();
    h.manager.restore().await;

    let release = h.identity.hold_exchange("1001");
    let slow = {
        let manager = Arc::clone(&h.manager);
        tokio::spawn(async move { manager.sign_in("1001", "correct-pw").await })
    };
    while !h.manager.pending() {
        tokio::task::yield_now().await;
    }

    let fast = h.manager.sign_in("1002", "correct-pw").await.expect("sign in");
    assert_eq!(fast.session.role, Role::Admin);

    release.notify_one();
    let slow = slow.await.expect("task");

    assert_eq!(slow, Err(AuthError::Superseded));
    assert!(h.manager.is_admin());
    assert_eq!(h.manager.session().map(|s| s.subject_id), Some("1002".into()));
    assert!(!h.manager.pending());
    assert_no_partial_auth(&h.manager);

    // The losing exchange's token is revoked and the winner's stays active.
    assert_eq!(h.identity.revoked().len(), 1);
    assert_eq!(
        h.identity.active().map(|t| t.subject_id),
        Some("1002".to_string())
    );
    let restored = h.manager.restore().await;
    assert_eq!(restored.session().map(|s| s.subject_id.as_str()), Some("1002"));
}

#[tokio::test]
async fn sign_out_during_sign_in_stays_signed_out() {
    let h = harness();
    h.manager.restore().await;

    let release = h.identity.hold_exchange("1001");
    let slow = {
        let manager = Arc::clone(&h.manager);
        tokio::spawn(async move { manager.sign_in("1001", "correct-pw").await })
    };
    while !h.manager.pending() {
        tokio::task::yield_now().await;
    }

    h.manager.sign_out().await;
    release.notify_one();
    let slow = slow.await.expect("task");

    assert_eq!(slow, Err(AuthError::Superseded));
    assert_eq!(h.manager.state(), SessionState::LoggedOut);
    assert!(h.identity.active().is_none());
    assert_eq!(h.identity.revoked().len(), 1);
    assert_eq!(h.manager.restore().await, SessionState::LoggedOut);
    assert_no_partial_auth(&h.manager);
}

#[tokio::test]
async fn switching_accounts_revokes_the_replaced_token() {
    let h = harness();
    h.manager.restore().await;
    h.manager.sign_in("1001", "correct-pw").await.expect("sign in");
    let first = h.identity.active().expect("token issued");

    h.manager.sign_in("1002", "correct-pw").await.expect("sign in");

    assert_eq!(h.identity.revoked(), vec![first.access_token]);
    assert_eq!(
        h.identity.active().map(|t| t.subject_id),
        Some("1002".to_string())
    );
    assert_eq!(h.manager.last_error(), None);

    h.identity.set_revoke_fails(true);
    h.manager.sign_in("1001", "correct-pw").await.expect("sign in");

    assert_eq!(h.manager.state().role(), Some(Role::Staff));
    assert_eq!(
        h.manager.last_error().map(|e| e.kind()),
        Some(AuthErrorKind::RevokeFailed)
    );
    assert_eq!(h.identity.revoked().len(), 2);
}

// --- sign out ---

#[tokio::test]
async fn sign_out_returns_entry_route() {
    let h = harness();
    h.manager.restore().await;
    h.manager.sign_in("1001", "correct-pw").await.expect("sign in");

    let route = h.manager.sign_out().await;

    assert_eq!(route, Route::ENTRY);
    assert_eq!(h.manager.state(), SessionState::LoggedOut);
    assert!(h.identity.active().is_none());
    assert_eq!(h.manager.last_error(), None);
}

#[tokio::test]
async fn sign_out_is_logged_out_even_if_revoke_fails() {
    let h = harness();
    h.manager.restore().await;
    h.manager.sign_in("1002", "correct-pw").await.expect("sign in");
    h.identity.set_revoke_fails(true);

    h.manager.sign_out().await;

    assert_eq!(h.manager.state(), SessionState::LoggedOut);
    assert_eq!(
        h.manager.last_error().map(|e| e.kind()),
        Some(AuthErrorKind::RevokeFailed)
    );
    assert_no_partial_auth(&h.manager);
}

#[tokio::test]
async fn sign_out_before_restore_settles_logged_out() {
    let h = harness();

    h.manager.sign_out().await;

    assert_eq!(h.manager.state(), SessionState::LoggedOut);
}

// --- invariants across sequences ---

#[tokio::test]
async fn no_partial_authentication_across_sequences() {
    let h = harness();
    h.manager.restore().await;
    assert_no_partial_auth(&h.manager);

    let steps: [(&str, &str); 6] = [
        ("1001", "correct-pw"),
        ("1002", "nope"),
        ("1002", "correct-pw"),
        ("", ""),
        ("ghost", "correct-pw"),
        ("1001", "correct-pw"),
    ];
    for (i, (identifier, secret)) in steps.into_iter().enumerate() {
        let _ = h.manager.sign_in(identifier, secret).await;
        assert_no_partial_auth(&h.manager);
        if i % 2 == 1 {
            h.manager.sign_out().await;
            assert_no_partial_auth(&h.manager);
        }
        h.manager.restore().await;
        assert_no_partial_auth(&h.manager);
    }
}

// --- observers ---

#[tokio::test]
async fn observers_see_each_transition_before_call_returns() {
    let h = harness();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = h
        .manager
        .subscribe(move |state: &SessionState| sink.lock().push(state.status()));

    h.manager.restore().await;
    assert_eq!(*seen.lock(), vec![SessionStatus::LoggedOut]);

    h.manager.sign_in("1001", "correct-pw").await.expect("sign in");
    assert_eq!(
        *seen.lock(),
        vec![SessionStatus::LoggedOut, SessionStatus::LoggedIn]
    );

    h.manager.sign_out().await;
    assert_eq!(seen.lock().last(), Some(&SessionStatus::LoggedOut));

    assert!(h.manager.unsubscribe(id));
    h.manager.sign_in("1002", "correct-pw").await.expect("sign in");
    assert_eq!(seen.lock().len(), 3);
}

// --- pushed token changes ---

#[tokio::test]
async fn listener_applies_external_revocation() {
    let h = harness();
    let listener = h.manager.spawn_listener();
    h.manager.restore().await;
    h.manager.sign_in("1001", "correct-pw").await.expect("sign in");

    h.identity.push_external(None);
    settle(&h.manager, SessionStatus::LoggedOut).await;

    assert_no_partial_auth(&h.manager);
    listener.abort();
}

#[tokio::test]
async fn listener_applies_changes_in_order() {
    let h = harness();
    let listener = h.manager.spawn_listener();
    h.manager.restore().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    h.manager
        .subscribe(move |state: &SessionState| sink.lock().push(state.role()));

    h.identity.push_external(Some(h.identity.mint("1002", None)));
    h.identity.push_external(Some(h.identity.mint("1001", None)));
    h.identity.push_external(None);
    for _ in 0..100 {
        if seen.lock().len() >= 3 {
            break;
        }
        tokio::task::yield_now().await;
    }

    assert_eq!(
        *seen.lock(),
        vec![Some(Role::Admin), Some(Role::Staff), None]
    );
    listener.abort();
}

#[tokio::test]
async fn pushed_token_without_record_clears_session() {
    let h = harness();
    h.manager.restore().await;
    h.manager.sign_in("1002", "correct-pw").await.expect("sign in");

    let state = h
        .manager
        .apply_token_change(Some(h.identity.mint("ghost", None)))
        .await;

    assert_eq!(state, SessionState::LoggedOut);
    assert_eq!(
        h.manager.last_error().map(|e| e.kind()),
        Some(AuthErrorKind::UserRecordMissing)
    );
}

#[tokio::test]
async fn pushed_token_is_resolved_with_its_own_bearer() {
    let h = harness();
    h.manager.restore().await;
    h.manager.sign_in("1001", "correct-pw").await.expect("sign in");

    let pushed = h.identity.mint("1002", None);
    let state = h.manager.apply_token_change(Some(pushed.clone())).await;

    assert!(state.is_admin());
    assert_eq!(h.users.bearers().last(), Some(&pushed.access_token));
}

#[tokio::test]
async fn lagged_listener_resyncs_from_the_store() {
    let h = harness();
    h.manager.restore().await;
    let listener = h.manager.spawn_listener();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    h.manager
        .subscribe(move |state: &SessionState| sink.lock().push(state.role()));

    // Overflow the change channel before the listener gets to run, then
    // leave an admin token active. Only a re-sync can observe it.
    for _ in 0..80 {
        h.identity.push_external(None);
    }
    h.identity.set_active(Some(h.identity.mint("1002", None)));

    for _ in 0..100 {
        if seen.lock().len() >= 2 {
            break;
        }
        tokio::task::yield_now().await;
    }

    assert_eq!(*seen.lock(), vec![Some(Role::Admin), None]);
    listener.abort();
}

#[tokio::test]
async fn listener_stops_when_manager_is_dropped() {
    let h = harness();
    let listener = h.manager.spawn_listener();
    drop(h.manager);

    h.identity.push_external(None);
    tokio::time::timeout(std::time::Duration::from_secs(1), listener)
        .await
        .expect("listener exits")
        .expect("task");
}
