// tests/client_session.rs - Header, CSRF and refresh behaviour against a live server
mod common;

use std::sync::atomic::Ordering;

use common::{MockBackend, REFRESHED_ACCESS, TIMEZONE};
use labdash::api::{auth, reagents, users};
use labdash::models::{LoginRequest, ReagentDisposalCreateRequest, User, UserUpdateRequest};
use labdash::ApiError;

#[actix_rt::test]
async fn test_expired_token_refreshes_once_and_retries() {
    let backend = MockBackend::start();
    let (client, navigator) = backend.client("stale", "refresh-1");

    let user: User = client.get("/api/auth/me").await.unwrap();
    assert_eq!(user.email, "kim@lab.io");

    assert_eq!(backend.state.refresh_calls.load(Ordering::SeqCst), 1);
    let calls = backend.state.requests_to("GET", "/api/auth/me");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer stale"));
    assert_eq!(calls[1].authorization, Some(format!("Bearer {}", REFRESHED_ACCESS)));

    let refresh = &backend.state.requests_to("POST", "/api/auth/refresh")[0];
    assert_eq!(refresh.body["refresh_token"], "refresh-1");
    assert_eq!(client.csrf_token().as_deref(), Some("csrf-2"));
    assert!(navigator.redirects().is_empty());
}

#[actix_rt::test]
async fn test_rejected_refresh_redirects_to_login() {
    let backend = MockBackend::start();
    backend.state.refresh_succeeds.store(false, Ordering::SeqCst);
    let (client, navigator) = backend.client("stale", "refresh-1");

    let err = client.get::<User>("/api/auth/me").await.unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(backend.state.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.state.requests_to("GET", "/api/auth/me").len(), 1);
    assert_eq!(navigator.redirects(), vec!["/login".to_string()]);
}

#[actix_rt::test]
async fn test_retry_is_attempted_only_once() {
    let backend = MockBackend::start();
    backend.state.revoke_all.store(true, Ordering::SeqCst);
    let (client, navigator) = backend.client("stale", "refresh-1");

    let err = client.get::<User>("/api/auth/me").await.unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(backend.state.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.state.requests_to("GET", "/api/auth/me").len(), 2);
    assert_eq!(navigator.redirects().len(), 1);
}

#[actix_rt::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let backend = MockBackend::start();
    let (client, _) = backend.client("stale", "refresh-1");

    let (a, b) = futures::join!(client.get::<User>("/api/auth/me"), client.get::<User>("/api/auth/me"));
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(backend.state.refresh_calls.load(Ordering::SeqCst), 1);
}

#[actix_rt::test]
async fn test_failed_login_is_not_refreshed() {
    let backend = MockBackend::start();
    let (client, navigator) = backend.client("stale", "refresh-1");

    let payload = LoginRequest {
        email: "kim@lab.io".to_string(),
        password: "wrong".to_string(),
    };
    let err = auth::login(&client, &payload).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(backend.state.refresh_calls.load(Ordering::SeqCst), 0);
    assert!(navigator.redirects().is_empty());
}

#[actix_rt::test]
async fn test_csrf_only_on_mutating_requests() {
    let backend = MockBackend::start();
    let (client, _) = backend.client("none", "none");

    let payload = LoginRequest {
        email: "kim@lab.io".to_string(),
        password: "Test1234".to_string(),
    };
    auth::login(&client, &payload).await.unwrap();
    reagents::fetch_reagents(&client, 10, None, None).await.unwrap();
    let disposal = ReagentDisposalCreateRequest {
        reason: "Expired".to_string(),
        disposed_by: "Dr. Kim".to_string(),
    };
    reagents::dispose_reagent(&client, "R1", &disposal).await.unwrap();

    let login = &backend.state.requests_to("POST", "/api/auth/login")[0];
    assert_eq!(login.csrf, None);

    let list = &backend.state.requests_to("GET", "/api/reagents")[0];
    assert_eq!(list.csrf, None);
    assert_eq!(list.authorization.as_deref(), Some("Bearer access-1"));

    let dispose = &backend.state.requests_to("POST", "/api/reagents/R1/dispose")[0];
    assert_eq!(dispose.csrf.as_deref(), Some("csrf-1"));
    assert_eq!(dispose.body["disposedBy"], "Dr. Kim");

    assert!(backend
        .state
        .requests()
        .iter()
        .all(|r| r.timezone.as_deref() == Some(TIMEZONE)));
}

#[actix_rt::test]
async fn test_csrf_on_patch_and_delete() {
    let backend = MockBackend::start();
    let (client, _) = backend.client("none", "none");

    let payload = LoginRequest {
        email: "kim@lab.io".to_string(),
        password: "Test1234".to_string(),
    };
    auth::login(&client, &payload).await.unwrap();

    let update = UserUpdateRequest {
        name: Some("Dr. Park".to_string()),
        ..Default::default()
    };
    let user = users::update_user(&client, 12, &update).await.unwrap();
    assert_eq!(user.id, 12);
    assert_eq!(user.name.as_deref(), Some("Dr. Park"));
    users::delete_user(&client, 12).await.unwrap();

    let patch = &backend.state.requests_to("PATCH", "/api/users/12")[0];
    assert_eq!(patch.csrf.as_deref(), Some("csrf-1"));
    assert_eq!(patch.body["name"], "Dr. Park");

    let delete = &backend.state.requests_to("DELETE", "/api/users/12")[0];
    assert_eq!(delete.csrf.as_deref(), Some("csrf-1"));
    assert_eq!(delete.authorization.as_deref(), Some("Bearer access-1"));
}
