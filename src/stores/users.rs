// src/stores/users.rs - Admin user management
use std::sync::{Arc, RwLock};

use validator::Validate;

use super::{read_state, write_state, DataSource, RequestSequencer};
use crate::api::users as api;
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::fixtures;
use crate::models::{PasswordResetRequest, User, UserCreateRequest, UserUpdateRequest};

#[derive(Debug, Clone, Default)]
pub struct UserState {
    pub users: Vec<User>,
    pub total: u64,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct UserStore {
    client: Arc<ApiClient>,
    source: DataSource,
    limit: u32,
    state: RwLock<UserState>,
    sequencer: RequestSequencer,
}

impl UserStore {
    pub fn new(client: Arc<ApiClient>, source: DataSource) -> Self {
        Self {
            client,
            source,
            limit: api::DEFAULT_PAGE_SIZE,
            state: RwLock::new(UserState::default()),
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn snapshot(&self) -> UserState {
        read_state(&self.state).clone()
    }

    pub fn users(&self) -> Vec<User> {
        read_state(&self.state).users.clone()
    }

    pub fn total(&self) -> u64 {
        read_state(&self.state).total
    }

    pub async fn load(&self) -> ApiResult<()> {
        if self.source.is_mock() {
            return Ok(());
        }

        let ticket = self.sequencer.issue("list");
        {
            let mut state = write_state(&self.state);
            state.is_loading = true;
            state.error = None;
        }
        let result = api::fetch_users(&self.client, self.limit, None).await;
        if !self.sequencer.accept(&ticket) {
            return Ok(());
        }

        let mut state = write_state(&self.state);
        state.is_loading = false;
        match result {
            Ok(response) => {
                state.users = response.items;
                state.total = response.total;
                Ok(())
            }
            Err(e) => {
                log::warn!("User load failed: {}", e);
                if state.users.is_empty() {
                    state.users = fixtures::sample_users();
                    state.total = state.users.len() as u64;
                }
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Creates a user on the server, then lists it first.
    pub async fn create(&self, payload: &UserCreateRequest) -> ApiResult<User> {
        let created = if self.source.is_mock() {
            payload.validate()?;
            let next_id = self.users().iter().map(|u| u.id).max().unwrap_or(0) + 1;
            User {
                id: next_id,
                email: payload.email.clone(),
                name: Some(payload.name.clone()),
                affiliation: payload.affiliation.clone(),
                department: payload.department.clone(),
                position: payload.position.clone(),
                phone: payload.phone.clone(),
                contact_email: payload.contact_email.clone(),
                profile_image_url: payload.profile_image_url.clone(),
                role: payload.role,
                is_active: true,
                created_at: Some(super::now_iso()),
                last_login_at: None,
            }
        } else {
            api::create_user(&self.client, payload).await?
        };

        let mut state = write_state(&self.state);
        state.users.insert(0, created.clone());
        state.total += 1;
        Ok(created)
    }

    /// Applies `payload` locally first; the server's user replaces it, or the
    /// previous user comes back on failure.
    pub async fn update(&self, user_id: i64, payload: &UserUpdateRequest) -> ApiResult<User> {
        payload.validate()?;
        let previous = self.apply_local(user_id, |user| payload.apply_to(user))?;
        if self.source.is_mock() {
            return self.user(user_id).ok_or_else(|| ApiError::user_not_found(user_id));
        }

        match api::update_user(&self.client, user_id, payload).await {
            Ok(updated) => {
                self.replace(user_id, updated.clone());
                Ok(updated)
            }
            Err(e) => {
                log::warn!("Update of user {} failed, rolling back: {}", user_id, e);
                self.replace(user_id, previous);
                Err(e)
            }
        }
    }

    /// Marks the account inactive.
    pub async fn deactivate(&self, user_id: i64) -> ApiResult<()> {
        let previous = self.apply_local(user_id, |user| user.is_active = false)?;
        if self.source.is_mock() {
            return Ok(());
        }

        if let Err(e) = api::delete_user(&self.client, user_id).await {
            log::warn!("Deactivation of user {} failed, rolling back: {}", user_id, e);
            self.replace(user_id, previous);
            return Err(e);
        }
        Ok(())
    }

    /// Removes the account for good.
    pub async fn delete_hard(&self, user_id: i64) -> ApiResult<()> {
        let (index, removed) = {
            let mut state = write_state(&self.state);
            let index = state
                .users
                .iter()
                .position(|u| u.id == user_id)
                .ok_or_else(|| ApiError::user_not_found(user_id))?;
            let removed = state.users.remove(index);
            state.total = state.total.saturating_sub(1);
            (index, removed)
        };
        if self.source.is_mock() {
            return Ok(());
        }

        if let Err(e) = api::delete_user_hard(&self.client, user_id).await {
            log::warn!("Deletion of user {} failed, rolling back: {}", user_id, e);
            let mut state = write_state(&self.state);
            if !state.users.iter().any(|u| u.id == user_id) {
                let index = index.min(state.users.len());
                state.users.insert(index, removed);
                state.total += 1;
            }
            return Err(e);
        }
        let mut state = write_state(&self.state);
        let before = state.users.len();
        state.users.retain(|u| u.id != user_id);
        if state.users.len() < before {
            state.total = state.total.saturating_sub(1);
        }
        Ok(())
    }

    pub async fn reset_password(&self, user_id: i64, password: &str) -> ApiResult<()> {
        if self.source.is_mock() {
            PasswordResetRequest {
                password: password.to_string(),
            }
            .validate()?;
            return Ok(());
        }
        api::reset_user_password(&self.client, user_id, password).await?;
        log::info!("Password reset for user {}", user_id);
        Ok(())
    }

    fn user(&self, user_id: i64) -> Option<User> {
        read_state(&self.state).users.iter().find(|u| u.id == user_id).cloned()
    }

    /// Changes the cached user in place and returns its previous value.
    fn apply_local<F>(&self, user_id: i64, f: F) -> ApiResult<User>
    where
        F: FnOnce(&mut User),
    {
        let mut state = write_state(&self.state);
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| ApiError::user_not_found(user_id))?;
        let previous = user.clone();
        f(user);
        Ok(previous)
    }

    fn replace(&self, user_id: i64, user: User) {
        let mut state = write_state(&self.state);
        if let Some(slot) = state.users.iter_mut().find(|u| u.id == user_id) {
            *slot = user;
        }
    }
}
