// src/stores/reagents.rs - Active inventory, disposals and storage readings
use std::sync::{Arc, RwLock};
use validator::Validate;

use super::{read_state, today, write_state, DataSource, RequestSequencer};
use crate::api::reagents as api;
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::fixtures;
use crate::format::format_quantity;
use crate::models::{
    DisposalView, ReagentCreateRequest, ReagentDisposalCreateRequest, ReagentStatus, ReagentUpdateRequest,
    ReagentView, StorageView, UNASSIGNED_LOCATION,
};

const LOAD_LIMIT: u32 = 200;

#[derive(Debug, Clone, Default)]
pub struct ReagentState {
    pub reagents: Vec<ReagentView>,
    pub disposed: Vec<DisposalView>,
    pub storage: Vec<StorageView>,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

pub struct ReagentStore {
    client: Arc<ApiClient>,
    source: DataSource,
    state: RwLock<ReagentState>,
    fallback: ReagentState,
    sequencer: RequestSequencer,
}

impl ReagentStore {
    /// Starts from the sample inventory, which is also the fallback.
    pub fn new(client: Arc<ApiClient>, source: DataSource) -> Self {
        let fallback = ReagentState {
            reagents: fixtures::sample_reagents(),
            disposed: fixtures::sample_disposals(),
            storage: fixtures::sample_storage(),
            ..Default::default()
        };
        Self::with_fallback(client, source, fallback)
    }

    pub fn with_fallback(client: Arc<ApiClient>, source: DataSource, fallback: ReagentState) -> Self {
        Self {
            client,
            source,
            state: RwLock::new(fallback.clone()),
            fallback,
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn snapshot(&self) -> ReagentState {
        read_state(&self.state).clone()
    }

    pub fn reagents(&self) -> Vec<ReagentView> {
        read_state(&self.state).reagents.clone()
    }

    pub fn disposed(&self) -> Vec<DisposalView> {
        read_state(&self.state).disposed.clone()
    }

    pub fn storage(&self) -> Vec<StorageView> {
        read_state(&self.state).storage.clone()
    }

    pub fn is_loading(&self) -> bool {
        read_state(&self.state).is_loading
    }

    // ==================== LOAD ====================

    pub async fn load(&self) -> ApiResult<()> {
        if self.source.is_mock() {
            return Ok(());
        }

        let ticket = self.sequencer.issue("list");
        write_state(&self.state).is_loading = true;

        let result = futures::try_join!(
            api::fetch_reagents(&self.client, LOAD_LIMIT, None, None),
            api::fetch_disposals(&self.client, LOAD_LIMIT, None),
            api::fetch_storage_environment(&self.client),
        );

        if !self.sequencer.accept(&ticket) {
            return Ok(());
        }

        let mut state = write_state(&self.state);
        state.is_loading = false;
        match result {
            Ok((reagents, disposals, storage)) => {
                state.reagents = reagents.items.iter().map(ReagentView::from).collect();
                state.disposed = disposals.items.iter().map(DisposalView::from).collect();
                state.storage = storage.items.iter().map(StorageView::from).collect();
                state.last_error = None;
                log::info!(
                    "Loaded {} reagents, {} disposals, {} storage readings",
                    state.reagents.len(),
                    state.disposed.len(),
                    state.storage.len()
                );
                Ok(())
            }
            Err(e) => {
                log::warn!("Reagent load failed, keeping current data: {}", e);
                if state.reagents.is_empty() {
                    state.reagents = self.fallback.reagents.clone();
                }
                if state.disposed.is_empty() {
                    state.disposed = self.fallback.disposed.clone();
                }
                if state.storage.is_empty() {
                    state.storage = self.fallback.storage.clone();
                }
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // ==================== MUTATIONS ====================

    pub async fn add(&self, payload: &ReagentCreateRequest) -> ApiResult<ReagentView> {
        payload.validate()?;
        let view = if self.source.is_mock() {
            mock_reagent(payload)
        } else {
            let created = api::create_reagent(&self.client, payload).await?;
            ReagentView::from(&created)
        };
        write_state(&self.state).reagents.insert(0, view.clone());
        Ok(view)
    }

    pub async fn update(&self, reagent_id: &str, payload: &ReagentUpdateRequest) -> ApiResult<ReagentView> {
        payload.validate()?;
        let view = if self.source.is_mock() {
            let mut current = self
                .reagents()
                .into_iter()
                .find(|r| r.id == reagent_id)
                .ok_or_else(|| ApiError::reagent_not_found(reagent_id))?;
            apply_update(&mut current, payload);
            current
        } else {
            let updated = api::update_reagent(&self.client, reagent_id, payload).await?;
            ReagentView::from(&updated)
        };

        let mut state = write_state(&self.state);
        if let Some(slot) = state.reagents.iter_mut().find(|r| r.id == reagent_id) {
            *slot = view.clone();
        }
        Ok(view)
    }

    /// Moves a reagent into the disposal list. The reagent leaves the active
    /// list and a pending disposal record is prepended in the same step; the
    /// server's record replaces it on success, and a failure puts the reagent
    /// back where it was. A load finishing in between may have listed the
    /// reagent again, so both outcomes match by id.
    pub async fn dispose(&self, reagent_id: &str, reason: &str, disposed_by: &str) -> ApiResult<DisposalView> {
        let payload = ReagentDisposalCreateRequest {
            reason: reason.to_string(),
            disposed_by: disposed_by.to_string(),
        };
        payload.validate()?;

        let (index, reagent, provisional) = {
            let mut state = write_state(&self.state);
            let index = state
                .reagents
                .iter()
                .position(|r| r.id == reagent_id)
                .ok_or_else(|| ApiError::reagent_not_found(reagent_id))?;
            let reagent = state.reagents.remove(index);
            let provisional = DisposalView::provisional(&reagent, reason, disposed_by, &today());
            state.disposed.insert(0, provisional.clone());
            (index, reagent, provisional)
        };

        if self.source.is_mock() {
            let record = DisposalView {
                pending: false,
                ..provisional
            };
            self.replace_provisional(reagent_id, record.clone());
            return Ok(record);
        }

        match api::dispose_reagent(&self.client, reagent_id, &payload).await {
            Ok(record) => {
                let view = DisposalView::from(&record);
                self.replace_provisional(reagent_id, view.clone());
                log::info!("Disposed reagent {} as {}", reagent_id, view.id);
                Ok(view)
            }
            Err(e) => {
                log::warn!("Dispose of {} failed, rolling back: {}", reagent_id, e);
                let mut state = write_state(&self.state);
                state.disposed.retain(|d| !(d.pending && d.id == reagent_id));
                if !state.reagents.iter().any(|r| r.id == reagent_id) {
                    let index = index.min(state.reagents.len());
                    state.reagents.insert(index, reagent);
                }
                Err(e)
            }
        }
    }

    fn replace_provisional(&self, reagent_id: &str, record: DisposalView) {
        let mut state = write_state(&self.state);
        state.reagents.retain(|r| r.id != reagent_id);
        match state.disposed.iter_mut().find(|d| d.pending && d.id == reagent_id) {
            Some(slot) => *slot = record,
            None => state.disposed.insert(0, record),
        }
    }

    pub async fn restore(&self, disposal_id: &str) -> ApiResult<ReagentView> {
        let view = if self.source.is_mock() {
            let disposal = self
                .disposed()
                .into_iter()
                .find(|d| d.id == disposal_id)
                .ok_or_else(|| ApiError::reagent_not_found(disposal_id))?;
            restored_from_disposal(&disposal)
        } else {
            let restored = api::restore_reagent(&self.client, disposal_id).await?;
            ReagentView::from(&restored)
        };

        let mut state = write_state(&self.state);
        state.disposed.retain(|d| d.id != disposal_id);
        state.reagents.insert(0, view.clone());
        Ok(view)
    }

    pub async fn delete_permanently(&self, disposal_id: &str) -> ApiResult<()> {
        if !self.source.is_mock() {
            api::delete_reagent_permanently(&self.client, disposal_id).await?;
        }
        write_state(&self.state).disposed.retain(|d| d.id != disposal_id);
        Ok(())
    }

    pub async fn clear_disposed(&self) -> ApiResult<()> {
        if !self.source.is_mock() {
            api::clear_all_disposals(&self.client).await?;
        }
        write_state(&self.state).disposed.clear();
        Ok(())
    }
}

fn mock_reagent(payload: &ReagentCreateRequest) -> ReagentView {
    ReagentView {
        id: payload
            .id
            .clone()
            .unwrap_or_else(|| format!("R{}", chrono::Utc::now().timestamp_millis())),
        name: payload.name.clone(),
        formula: payload.formula.clone(),
        purchase_date: payload.purchase_date.clone().unwrap_or_else(today),
        open_date: payload.open_date.clone(),
        current_volume: format_quantity(
            payload.current_volume.as_ref().or(Some(&payload.original_volume)),
            "0",
        ),
        total_capacity: format_quantity(Some(&payload.original_volume), "0"),
        purity: crate::format::format_percent(Some(payload.purity)),
        location: payload.location.clone(),
        density: payload.density.unwrap_or(0.0),
        mass: payload.mass.unwrap_or(0.0),
        status: payload.status.unwrap_or_default(),
    }
}

fn apply_update(view: &mut ReagentView, payload: &ReagentUpdateRequest) {
    if let Some(name) = &payload.name {
        view.name = name.clone();
    }
    if let Some(formula) = &payload.formula {
        view.formula = formula.clone();
    }
    if let Some(location) = &payload.location {
        view.location = location.clone();
    }
    if let Some(volume) = &payload.current_volume {
        view.current_volume = format_quantity(Some(volume), "0");
    }
    if let Some(volume) = &payload.original_volume {
        view.total_capacity = format_quantity(Some(volume), "0");
    }
    if let Some(purity) = payload.purity {
        view.purity = crate::format::format_percent(Some(purity));
    }
    if let Some(density) = payload.density {
        view.density = density;
    }
    if let Some(mass) = payload.mass {
        view.mass = mass;
    }
    if let Some(status) = payload.status {
        view.status = status;
    }
}

fn restored_from_disposal(disposal: &DisposalView) -> ReagentView {
    ReagentView {
        id: disposal.id.clone(),
        name: disposal.name.clone(),
        formula: disposal.formula.clone(),
        purchase_date: String::new(),
        open_date: None,
        current_volume: "0".to_string(),
        total_capacity: "0".to_string(),
        purity: "0%".to_string(),
        location: UNASSIGNED_LOCATION.to_string(),
        density: 0.0,
        mass: 0.0,
        status: ReagentStatus::Normal,
    }
}
