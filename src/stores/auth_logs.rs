// src/stores/auth_logs.rs - Per-user authentication history
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{read_state, write_state, DataSource, RequestSequencer};
use crate::api::users as api;
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::AuthLog;

/// Logs, loading flags and errors keyed by user id. Keys are independent.
#[derive(Debug, Clone, Default)]
pub struct AuthLogState {
    pub logs: HashMap<i64, Vec<AuthLog>>,
    pub loading: HashMap<i64, bool>,
    pub errors: HashMap<i64, String>,
}

pub struct AuthLogStore {
    client: Arc<ApiClient>,
    source: DataSource,
    state: RwLock<AuthLogState>,
    sequencer: RequestSequencer,
}

impl AuthLogStore {
    pub fn new(client: Arc<ApiClient>, source: DataSource) -> Self {
        Self {
            client,
            source,
            state: RwLock::new(AuthLogState::default()),
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn snapshot(&self) -> AuthLogState {
        read_state(&self.state).clone()
    }

    /// Cached logs of `user_id`; `None` until loaded.
    pub fn logs(&self, user_id: i64) -> Option<Vec<AuthLog>> {
        read_state(&self.state).logs.get(&user_id).cloned()
    }

    pub fn is_loading(&self, user_id: i64) -> bool {
        read_state(&self.state).loading.get(&user_id).copied().unwrap_or(false)
    }

    pub fn error(&self, user_id: i64) -> Option<String> {
        read_state(&self.state).errors.get(&user_id).cloned()
    }

    pub async fn load(&self, user_id: i64, limit: u32) -> ApiResult<Vec<AuthLog>> {
        if self.source.is_mock() {
            return Ok(self.logs(user_id).unwrap_or_default());
        }

        let ticket = self.sequencer.issue(user_id.to_string());
        {
            let mut state = write_state(&self.state);
            state.loading.insert(user_id, true);
            state.errors.remove(&user_id);
        }
        let result = api::fetch_user_auth_logs(&self.client, user_id, limit).await;
        if !self.sequencer.accept(&ticket) {
            return Ok(self.logs(user_id).unwrap_or_default());
        }

        let mut state = write_state(&self.state);
        state.loading.insert(user_id, false);
        match result {
            Ok(response) => {
                state.logs.insert(user_id, response.items.clone());
                Ok(response.items)
            }
            Err(e) => {
                log::warn!("Auth log load for user {} failed: {}", user_id, e);
                state.errors.insert(user_id, e.to_string());
                Err(e)
            }
        }
    }

    /// Empties one user's history; the cached logs return if the backend refuses.
    pub async fn clear(&self, user_id: i64) -> ApiResult<()> {
        let previous = write_state(&self.state).logs.insert(user_id, Vec::new());
        if self.source.is_mock() {
            return Ok(());
        }

        if let Err(e) = api::delete_user_auth_logs(&self.client, user_id).await {
            log::warn!("Clearing auth logs of user {} failed, rolling back: {}", user_id, e);
            let mut state = write_state(&self.state);
            match previous {
                Some(logs) => state.logs.insert(user_id, logs),
                None => state.logs.remove(&user_id),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Empties every cached history.
    pub async fn clear_all(&self) -> ApiResult<()> {
        let previous = {
            let mut state = write_state(&self.state);
            let previous = state.logs.clone();
            for logs in state.logs.values_mut() {
                logs.clear();
            }
            previous
        };
        if self.source.is_mock() {
            return Ok(());
        }

        if let Err(e) = api::delete_all_user_auth_logs(&self.client).await {
            log::warn!("Clearing all auth logs failed, rolling back: {}", e);
            write_state(&self.state).logs = previous;
            return Err(e);
        }
        Ok(())
    }
}
