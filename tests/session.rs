// tests/session.rs - Sign-in lifecycle against a live server
mod common;

use common::{MockBackend, ISSUED_ACCESS};
use labdash::{AuthSession, AuthState, DataSource};

#[actix_rt::test]
async fn test_login_logout_cycle() {
    let backend = MockBackend::start();
    let (client, navigator) = backend.client("none", "none");
    client.token_store().clear().await.unwrap();
    let session = AuthSession::new(client.clone(), DataSource::Live);
    let mut updates = session.subscribe();

    let user = session.login("  kim@lab.io ", "Test1234").await.unwrap();
    assert_eq!(user.email, "kim@lab.io");
    assert!(session.is_admin());
    assert!(updates.has_changed().unwrap());
    assert!(matches!(*updates.borrow_and_update(), AuthState::Authenticated(_)));

    assert_eq!(client.token_store().access_token().await.as_deref(), Some(ISSUED_ACCESS));
    assert_eq!(client.csrf_token().as_deref(), Some("csrf-1"));

    let login = &backend.state.requests_to("POST", "/api/auth/login")[0];
    assert_eq!(login.body["email"], "kim@lab.io");

    session.logout().await;
    assert_eq!(session.state(), AuthState::Unauthenticated);
    assert_eq!(client.token_store().access_token().await, None);
    assert_eq!(client.csrf_token(), None);
    assert_eq!(navigator.redirects(), vec!["/login".to_string()]);

    let logout = &backend.state.requests_to("POST", "/api/auth/logout")[0];
    assert_eq!(logout.body["refresh_token"], "refresh-1");
    assert_eq!(logout.csrf.as_deref(), Some("csrf-1"));
}

#[actix_rt::test]
async fn test_start_restores_existing_session() {
    let backend = MockBackend::start();
    let (client, _) = backend.signed_in_client();
    let session = AuthSession::new(client, DataSource::Live);

    let state = session.start().await;
    assert_eq!(state.user().map(|u| u.id), Some(7));
    assert!(session.is_authenticated());
}

#[actix_rt::test]
async fn test_start_with_dead_session_is_unauthenticated() {
    let backend = MockBackend::start();
    backend
        .state
        .refresh_succeeds
        .store(false, std::sync::atomic::Ordering::SeqCst);
    let (client, _) = backend.client("stale", "stale");
    let session = AuthSession::new(client, DataSource::Live);

    assert_eq!(session.start().await, AuthState::Unauthenticated);
    assert!(session.current_user().is_none());
}

#[actix_rt::test]
async fn test_wrong_password_keeps_session_signed_out() {
    let backend = MockBackend::start();
    let (client, _) = backend.client("none", "none");
    let session = AuthSession::new(client, DataSource::Live);

    let err = session.login("kim@lab.io", "nope").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(session.state(), AuthState::Unauthenticated);
}
