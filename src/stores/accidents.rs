// src/stores/accidents.rs - Accident panel state
use std::sync::{Arc, RwLock};

use super::{read_state, write_state, DataSource, RequestSequencer};
use crate::api::monitoring::{self as api, AccidentFilter};
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::fixtures;
use crate::models::{Accident, AccidentStatus, Verification};

#[derive(Debug, Clone, Default)]
pub struct AccidentState {
    pub accidents: Vec<Accident>,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

pub struct AccidentStore {
    client: Arc<ApiClient>,
    source: DataSource,
    state: RwLock<AccidentState>,
    fallback: Vec<Accident>,
    sequencer: RequestSequencer,
}

impl AccidentStore {
    pub fn new(client: Arc<ApiClient>, source: DataSource) -> Self {
        let fallback = fixtures::sample_accidents();
        Self {
            client,
            source,
            state: RwLock::new(AccidentState {
                accidents: fallback.clone(),
                ..Default::default()
            }),
            fallback,
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn snapshot(&self) -> AccidentState {
        read_state(&self.state).clone()
    }

    pub fn accidents(&self) -> Vec<Accident> {
        read_state(&self.state).accidents.clone()
    }

    /// Accidents that still need attention.
    pub fn open_accidents(&self) -> Vec<Accident> {
        read_state(&self.state)
            .accidents
            .iter()
            .filter(|a| !a.status.is_closed())
            .cloned()
            .collect()
    }

    /// Replaces the list from the backend. On failure the sample accidents
    /// are shown and the error is returned.
    pub async fn load(&self, filter: &AccidentFilter) -> ApiResult<()> {
        if self.source.is_mock() {
            return Ok(());
        }

        let ticket = self.sequencer.issue("list");
        write_state(&self.state).is_loading = true;
        let result = api::fetch_accidents(&self.client, filter).await;
        if !self.sequencer.accept(&ticket) {
            return Ok(());
        }

        let mut state = write_state(&self.state);
        state.is_loading = false;
        match result {
            Ok(accidents) => {
                state.accidents = accidents;
                state.last_error = None;
                Ok(())
            }
            Err(e) => {
                log::warn!("Accident load failed, showing sample data: {}", e);
                state.accidents = self.fallback.clone();
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn acknowledge(&self, accident_id: i64) -> ApiResult<Accident> {
        self.verify(accident_id, Verification::Acknowledge, AccidentStatus::Acknowledged)
            .await
    }

    pub async fn resolve(&self, accident_id: i64) -> ApiResult<Accident> {
        self.verify(accident_id, Verification::Resolve, AccidentStatus::FalseAlarm)
            .await
    }

    /// Sends the verification. The local status moves to `local_status`
    /// whether or not the backend accepts it.
    async fn verify(
        &self,
        accident_id: i64,
        verification: Verification,
        local_status: AccidentStatus,
    ) -> ApiResult<Accident> {
        let local = {
            let mut state = write_state(&self.state);
            let accident = state
                .accidents
                .iter_mut()
                .find(|a| a.id == accident_id)
                .ok_or_else(|| ApiError::accident_not_found(accident_id))?;
            accident.status = local_status;
            accident.clone()
        };
        if self.source.is_mock() {
            return Ok(local);
        }

        let ticket = self.sequencer.issue(format!("accident:{}", accident_id));
        let result = api::update_accident(&self.client, accident_id, verification).await;
        match result {
            Ok(updated) => {
                if self.sequencer.accept(&ticket) {
                    let mut state = write_state(&self.state);
                    if let Some(slot) = state.accidents.iter_mut().find(|a| a.id == accident_id) {
                        *slot = updated.clone();
                    }
                }
                Ok(updated)
            }
            Err(e) => {
                log::warn!("Verification of accident {} failed: {}", accident_id, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn store(source: DataSource) -> AccidentStore {
        let client = Arc::new(ApiClient::new(&Config::for_base_url("http://127.0.0.1:1")).unwrap());
        AccidentStore::new(client, source)
    }

    #[tokio::test]
    async fn test_mock_acknowledge_and_resolve() {
        let store = store(DataSource::Mock);
        assert_eq!(store.acknowledge(1).await.unwrap().status, AccidentStatus::Acknowledged);
        assert_eq!(store.resolve(2).await.unwrap().status, AccidentStatus::FalseAlarm);
        assert_eq!(store.open_accidents().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_accident() {
        let store = store(DataSource::Mock);
        let err = store.acknowledge(99).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_live_failure_still_moves_status() {
        let store = store(DataSource::Live);
        assert!(store.resolve(1).await.is_err());
        let accident = store.accidents().into_iter().find(|a| a.id == 1).unwrap();
        assert_eq!(accident.status, AccidentStatus::FalseAlarm);
    }

    #[tokio::test]
    async fn test_live_load_failure_serves_samples() {
        let store = store(DataSource::Live);
        write_state(&store.state).accidents.clear();
        assert!(store.load(&AccidentFilter::default()).await.is_err());
        let state = store.snapshot();
        assert_eq!(state.accidents.len(), 4);
        assert!(state.last_error.is_some());
    }
}
