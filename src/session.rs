// src/session.rs - Signed-in user tracking
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::auth;
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::fixtures;
use crate::models::{LoginRequest, SignupRequest, User, UserSelfUpdateRequest};
use crate::stores::DataSource;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Loading,
    Authenticated(User),
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Owns the auth state and publishes every change to subscribers.
pub struct AuthSession {
    client: Arc<ApiClient>,
    source: DataSource,
    dev_login_secret: Option<String>,
    state: watch::Sender<AuthState>,
}

impl AuthSession {
    pub fn new(client: Arc<ApiClient>, source: DataSource) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            client,
            source,
            dev_login_secret: None,
            state,
        }
    }

    pub fn with_dev_login_secret(mut self, secret: Option<String>) -> Self {
        self.dev_login_secret = secret;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.borrow(), AuthState::Authenticated(_))
    }

    pub fn is_admin(&self) -> bool {
        self.state.borrow().user().map(User::is_admin).unwrap_or(false)
    }

    fn publish(&self, state: AuthState) {
        self.state.send_replace(state);
    }

    /// Resolves the stored session into a user. Any failure leaves the
    /// session unauthenticated and is not reported.
    pub async fn start(&self) -> AuthState {
        if self.source.is_mock() {
            self.publish(AuthState::Authenticated(fixtures::sample_admin()));
            return self.state();
        }

        self.publish(AuthState::Loading);
        match auth::fetch_current_user(&self.client).await {
            Ok(user) => {
                log::info!("Session restored for {}", user.email);
                self.publish(AuthState::Authenticated(user));
            }
            Err(e) => {
                log::debug!("No active session: {}", e);
                self.publish(AuthState::Unauthenticated);
            }
        }
        self.state()
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<User> {
        let payload = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response = auth::login(&self.client, &payload).await?;
        self.publish(AuthState::Authenticated(response.user.clone()));
        Ok(response.user)
    }

    pub async fn signup(&self, payload: &SignupRequest) -> ApiResult<User> {
        let response = auth::signup(&self.client, payload).await?;
        self.publish(AuthState::Authenticated(response.user.clone()));
        Ok(response.user)
    }

    pub async fn dev_login(&self) -> ApiResult<User> {
        let response = auth::dev_login(&self.client, self.dev_login_secret.as_deref()).await?;
        self.publish(AuthState::Authenticated(response.user.clone()));
        Ok(response.user)
    }

    /// Always ends up signed out and on the login page; a backend failure
    /// is only logged.
    pub async fn logout(&self) {
        if !self.source.is_mock() {
            if let Err(e) = auth::logout(&self.client).await {
                log::warn!("Backend logout failed: {}", e);
            }
        }
        self.publish(AuthState::Unauthenticated);
        self.client.navigator().redirect_to_login(self.client.login_path());
    }

    pub async fn update_profile(&self, payload: &UserSelfUpdateRequest) -> ApiResult<User> {
        let current = self.current_user().ok_or(ApiError::SessionExpired)?;
        let user = if self.source.is_mock() {
            let mut user = current;
            payload.apply_to(&mut user);
            user
        } else {
            auth::update_profile(&self.client, payload).await?
        };
        self.publish(AuthState::Authenticated(user.clone()));
        Ok(user)
    }

    /// Deletes the account. The session ends even if the backend refuses.
    pub async fn delete_account(&self) -> ApiResult<()> {
        let result = if self.source.is_mock() {
            Ok(())
        } else {
            auth::delete_account(&self.client).await.map(|_| ())
        };
        self.publish(AuthState::Unauthenticated);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RecordingNavigator;
    use crate::config::Config;
    use crate::token_store::MemoryTokenStore;

    fn session(source: DataSource) -> (AuthSession, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::new("/dashboard"));
        let client = ApiClient::new(&Config::for_base_url("http://127.0.0.1:1"))
            .unwrap()
            .with_token_store(Arc::new(MemoryTokenStore::with_tokens("access", "refresh")))
            .with_navigator(navigator.clone());
        (AuthSession::new(Arc::new(client), source), navigator)
    }

    #[tokio::test]
    async fn test_mock_start_authenticates_admin() {
        let (session, _) = session(DataSource::Mock);
        let mut rx = session.subscribe();
        let state = session.start().await;
        assert!(matches!(state, AuthState::Authenticated(_)));
        assert!(session.is_admin());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().user().unwrap().email, "admin@lab.local");
    }

    #[tokio::test]
    async fn test_live_start_failure_is_unauthenticated() {
        let (session, _) = session(DataSource::Live);
        assert_eq!(session.start().await, AuthState::Unauthenticated);
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_is_down() {
        let (session, navigator) = session(DataSource::Live);
        session.publish(AuthState::Authenticated(fixtures::sample_admin()));
        session.logout().await;

        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert_eq!(session.client.token_store().access_token().await, None);
        assert_eq!(navigator.redirects(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn test_login_validation_happens_before_network() {
        let (session, _) = session(DataSource::Live);
        let err = session.login("not-an-email", "secret").await.unwrap_err();
        assert!(!err.field_errors().is_empty());
        assert_eq!(session.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_mock_update_profile() {
        let (session, _) = session(DataSource::Mock);
        session.start().await;
        let update = UserSelfUpdateRequest {
            department: Some("Chemistry".to_string()),
            ..Default::default()
        };
        let user = session.update_profile(&update).await.unwrap();
        assert_eq!(user.department.as_deref(), Some("Chemistry"));
        assert_eq!(session.current_user().unwrap().department.as_deref(), Some("Chemistry"));
    }
}
