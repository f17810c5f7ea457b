// src/stores/experiments.rs - Experiment list, selection, memo and reagent usage
use std::sync::{Arc, RwLock};

use super::{read_state, today, write_state, DataSource, RequestSequencer};
use crate::api::experiments::{self as api, ExperimentListParams};
use crate::api::reagents::fetch_reagents;
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::fixtures;
use crate::models::{
    CatalogReagent, ExperimentCreateRequest, ExperimentReagentCreateRequest, ExperimentReagentView,
    ExperimentStatus, ExperimentUpdateRequest, ExperimentView, Quantity,
};
use crate::query::BASE_LANGUAGE;
use crate::validator::{FieldError, FieldValidator, FormField};

const LIST_LIMIT: u32 = 50;
const CATALOG_LIMIT: u32 = 200;

#[derive(Debug, Clone, Default)]
pub struct ExperimentState {
    pub experiments: Vec<ExperimentView>,
    pub selected: Option<ExperimentView>,
    /// Memo draft of the selected experiment.
    pub memo: String,
    pub catalog: Vec<CatalogReagent>,
    pub status_filter: Option<ExperimentStatus>,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

pub struct ExperimentStore {
    client: Arc<ApiClient>,
    source: DataSource,
    language: String,
    state: RwLock<ExperimentState>,
    fallback: Vec<ExperimentView>,
    sequencer: RequestSequencer,
}

impl ExperimentStore {
    pub fn new(client: Arc<ApiClient>, source: DataSource) -> Self {
        Self::with_fallback(
            client,
            source,
            fixtures::sample_experiments(),
            fixtures::sample_catalog(),
        )
    }

    pub fn with_fallback(
        client: Arc<ApiClient>,
        source: DataSource,
        experiments: Vec<ExperimentView>,
        catalog: Vec<CatalogReagent>,
    ) -> Self {
        Self {
            client,
            source,
            language: BASE_LANGUAGE.to_string(),
            state: RwLock::new(ExperimentState {
                experiments: experiments.clone(),
                catalog,
                ..Default::default()
            }),
            fallback: experiments,
            sequencer: RequestSequencer::new(),
        }
    }

    /// Requests translated titles and memos for `language`.
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn snapshot(&self) -> ExperimentState {
        read_state(&self.state).clone()
    }

    /// Experiments matching the current status filter.
    pub fn experiments(&self) -> Vec<ExperimentView> {
        let state = read_state(&self.state);
        state
            .experiments
            .iter()
            .filter(|e| state.status_filter.map_or(true, |s| e.status == s))
            .cloned()
            .collect()
    }

    pub fn selected(&self) -> Option<ExperimentView> {
        read_state(&self.state).selected.clone()
    }

    pub fn memo(&self) -> String {
        read_state(&self.state).memo.clone()
    }

    pub fn set_memo(&self, memo: &str) {
        write_state(&self.state).memo = memo.to_string();
    }

    pub fn status_filter(&self) -> Option<ExperimentStatus> {
        read_state(&self.state).status_filter
    }

    /// Catalog entries offered for the selected experiment. Reagents may be
    /// added more than once.
    pub fn available_reagents(&self) -> Vec<CatalogReagent> {
        let state = read_state(&self.state);
        if state.selected.is_none() {
            return Vec::new();
        }
        state.catalog.clone()
    }

    fn language(&self) -> Option<&str> {
        Some(self.language.as_str()).filter(|l| *l != BASE_LANGUAGE)
    }

    // ==================== LOAD ====================

    pub async fn load(&self, filter: Option<ExperimentStatus>) -> ApiResult<()> {
        write_state(&self.state).status_filter = filter;
        if self.source.is_mock() {
            return Ok(());
        }

        let ticket = self.sequencer.issue("list");
        write_state(&self.state).is_loading = true;

        let params = ExperimentListParams {
            limit: Some(LIST_LIMIT),
            cursor: None,
            language: self.language().map(str::to_string),
            status: filter,
        };
        let result = futures::try_join!(
            api::fetch_experiments(&self.client, &params),
            fetch_reagents(&self.client, CATALOG_LIMIT, None, self.language()),
        );

        if !self.sequencer.accept(&ticket) {
            return Ok(());
        }

        let mut state = write_state(&self.state);
        state.is_loading = false;
        match result {
            Ok((experiments, catalog)) => {
                state.experiments = experiments.items.iter().map(ExperimentView::from).collect();
                let still_selected = state
                    .selected
                    .as_ref()
                    .map_or(true, |sel| state.experiments.iter().any(|e| e.id == sel.id));
                if !still_selected {
                    state.selected = None;
                    state.memo.clear();
                }
                if !catalog.items.is_empty() {
                    state.catalog = catalog.items.iter().map(CatalogReagent::from).collect();
                }
                state.last_error = None;
                Ok(())
            }
            Err(e) => {
                log::warn!("Experiment load failed, keeping current list: {}", e);
                if state.experiments.is_empty() {
                    state.experiments = self.fallback.clone();
                }
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn set_status_filter(&self, filter: Option<ExperimentStatus>) -> ApiResult<()> {
        self.load(filter).await
    }

    async fn reload(&self) {
        let filter = self.status_filter();
        if let Err(e) = self.load(filter).await {
            log::warn!("Experiment reload failed: {}", e);
        }
    }

    // ==================== SELECTION ====================

    /// Selects an experiment and fetches its detail when its reagents have
    /// not been loaded yet.
    pub async fn select(&self, exp_id: &str) -> ApiResult<ExperimentView> {
        let experiment = {
            let mut state = write_state(&self.state);
            let experiment = state
                .experiments
                .iter()
                .find(|e| e.id == exp_id)
                .cloned()
                .ok_or_else(|| ApiError::experiment_not_found(exp_id))?;
            state.memo = experiment.memo.clone();
            state.selected = Some(experiment.clone());
            experiment
        };

        if self.source.is_mock() || !experiment.reagents.is_empty() {
            return Ok(experiment);
        }

        let ticket = self.sequencer.issue("detail");
        let detail = api::fetch_experiment_detail(&self.client, exp_id, self.language()).await?;
        if !self.sequencer.accept(&ticket) {
            return Ok(experiment);
        }

        let view = ExperimentView::from(&detail);
        let mut state = write_state(&self.state);
        if state.selected.as_ref().map(|s| s.id.as_str()) == Some(exp_id) {
            state.selected = Some(view.clone());
            state.memo = view.memo.clone();
        }
        Ok(view)
    }

    pub fn clear_selection(&self) {
        let mut state = write_state(&self.state);
        state.selected = None;
        state.memo.clear();
    }

    // ==================== MUTATIONS ====================

    pub async fn create(&self, title: &str, researcher: &str) -> ApiResult<ExperimentView> {
        let view = if self.source.is_mock() {
            FieldValidator::not_empty(title)
                .map_err(|kind| ApiError::Validation(vec![FieldError::new(FormField::Title, kind)]))?;
            ExperimentView {
                id: format!("EXP-{}", chrono::Utc::now().timestamp_millis()),
                title: title.trim().to_string(),
                date: today(),
                status: ExperimentStatus::InProgress,
                researcher: researcher.to_string(),
                reagents: Vec::new(),
                memo: String::new(),
            }
        } else {
            let payload = ExperimentCreateRequest {
                title: title.trim().to_string(),
                researcher: Some(researcher.to_string()).filter(|r| !r.is_empty()),
                date: None,
                status: None,
                memo: None,
            };
            let created = api::create_experiment(&self.client, &payload).await?;
            ExperimentView::from(&created)
        };

        let mut state = write_state(&self.state);
        state.experiments.insert(0, view.clone());
        state.memo = view.memo.clone();
        state.selected = Some(view.clone());
        Ok(view)
    }

    /// Renames and re-statuses an experiment, showing the change right away.
    pub async fn update(&self, exp_id: &str, title: &str, status: ExperimentStatus) -> ApiResult<ExperimentView> {
        let payload = ExperimentUpdateRequest {
            title: Some(title.trim().to_string()),
            status: Some(status),
            ..Default::default()
        };
        validator::Validate::validate(&payload)?;

        let (previous, previous_selected) = {
            let mut state = write_state(&self.state);
            let slot = state
                .experiments
                .iter_mut()
                .find(|e| e.id == exp_id)
                .ok_or_else(|| ApiError::experiment_not_found(exp_id))?;
            let previous = slot.clone();
            slot.title = title.trim().to_string();
            slot.status = status;
            let updated = slot.clone();
            let previous_selected = state.selected.clone();
            if let Some(selected) = state.selected.as_mut().filter(|s| s.id == exp_id) {
                selected.title = updated.title;
                selected.status = status;
            }
            (previous, previous_selected)
        };

        if self.source.is_mock() {
            return Ok(self.experiment(exp_id).unwrap_or(previous));
        }

        match api::update_experiment(&self.client, exp_id, &payload).await {
            Ok(detail) => {
                let view = ExperimentView::from(&detail);
                let mut state = write_state(&self.state);
                if let Some(slot) = state.experiments.iter_mut().find(|e| e.id == exp_id) {
                    *slot = view.clone();
                }
                if state.selected.as_ref().map_or(false, |s| s.id == exp_id) {
                    state.selected = Some(view.clone());
                }
                Ok(view)
            }
            Err(e) => {
                log::warn!("Update of experiment {} failed, rolling back: {}", exp_id, e);
                let mut state = write_state(&self.state);
                if let Some(slot) = state.experiments.iter_mut().find(|e| e.id == exp_id) {
                    *slot = previous;
                }
                if state.selected.as_ref().map_or(false, |s| s.id == exp_id) {
                    state.selected = previous_selected;
                }
                Err(e)
            }
        }
    }

    pub async fn delete(&self, exp_id: &str) -> ApiResult<()> {
        let (index, removed, previous_selected, previous_memo) = {
            let mut state = write_state(&self.state);
            let index = state
                .experiments
                .iter()
                .position(|e| e.id == exp_id)
                .ok_or_else(|| ApiError::experiment_not_found(exp_id))?;
            let removed = state.experiments.remove(index);
            let previous_selected = state.selected.clone();
            let previous_memo = state.memo.clone();
            if state.selected.as_ref().map_or(false, |s| s.id == exp_id) {
                state.selected = None;
                state.memo.clear();
            }
            (index, removed, previous_selected, previous_memo)
        };

        if self.source.is_mock() {
            return Ok(());
        }

        if let Err(e) = api::delete_experiment(&self.client, exp_id).await {
            log::warn!("Delete of experiment {} failed, rolling back: {}", exp_id, e);
            let mut state = write_state(&self.state);
            if !state.experiments.iter().any(|e| e.id == exp_id) {
                let index = index.min(state.experiments.len());
                state.experiments.insert(index, removed);
            }
            if previous_selected.as_ref().map_or(false, |s| s.id == exp_id) && state.selected.is_none() {
                state.selected = previous_selected;
                state.memo = previous_memo;
            }
            return Err(e);
        }
        write_state(&self.state).experiments.retain(|e| e.id != exp_id);
        Ok(())
    }

    /// Adds a catalog reagent to the selected experiment; `dosage` is in ml.
    pub async fn add_reagent(&self, catalog_id: &str, dosage: &str) -> ApiResult<ExperimentReagentView> {
        let value = FieldValidator::dosage(dosage)
            .map_err(|kind| ApiError::Validation(vec![FieldError::new(FormField::Quantity, kind)]))?;
        let (exp_id, catalog_entry) = {
            let state = read_state(&self.state);
            let selected = state.selected.as_ref().ok_or_else(ApiError::no_experiment_selected)?;
            let entry = state
                .catalog
                .iter()
                .find(|c| c.id == catalog_id)
                .cloned()
                .ok_or_else(|| ApiError::reagent_not_found(catalog_id))?;
            (selected.id.clone(), entry)
        };

        let view = if self.source.is_mock() {
            ExperimentReagentView {
                id: format!("R-{}", uuid::Uuid::new_v4()),
                catalog_id: catalog_entry.id.clone(),
                name: catalog_entry.name.clone(),
                formula: catalog_entry.formula.clone(),
                dosage: dosage.trim().to_string(),
                volume: catalog_entry.current_volume.clone(),
                density: catalog_entry.density.clone(),
                mass: catalog_entry.mass.clone(),
                purity: catalog_entry.purity.clone(),
                location: catalog_entry.location.clone(),
            }
        } else {
            let payload = ExperimentReagentCreateRequest {
                reagent_id: catalog_id.to_string(),
                dosage: Quantity::ml(value),
            };
            let created = api::add_experiment_reagent(&self.client, &exp_id, &payload).await?;
            ExperimentReagentView {
                volume: catalog_entry.current_volume.clone(),
                ..ExperimentReagentView::from(&created)
            }
        };

        self.modify_reagents(&exp_id, |reagents| reagents.push(view.clone()));
        if !self.source.is_mock() {
            self.reload().await;
        }
        Ok(view)
    }

    pub async fn remove_reagent(&self, exp_reagent_id: &str) -> ApiResult<()> {
        let (exp_id, index, removed) = {
            let state = read_state(&self.state);
            let selected = state.selected.as_ref().ok_or_else(ApiError::no_experiment_selected)?;
            let index = selected
                .reagents
                .iter()
                .position(|r| r.id == exp_reagent_id)
                .ok_or_else(|| ApiError::reagent_not_found(exp_reagent_id))?;
            (selected.id.clone(), index, selected.reagents[index].clone())
        };

        self.modify_reagents(&exp_id, |reagents| reagents.retain(|r| r.id != exp_reagent_id));
        if self.source.is_mock() {
            return Ok(());
        }

        match api::remove_experiment_reagent(&self.client, &exp_id, exp_reagent_id).await {
            Ok(_) => {
                self.reload().await;
                Ok(())
            }
            Err(e) => {
                log::warn!("Removing reagent {} failed, rolling back: {}", exp_reagent_id, e);
                self.modify_reagents(&exp_id, |reagents| {
                    let index = index.min(reagents.len());
                    reagents.insert(index, removed.clone());
                });
                Err(e)
            }
        }
    }

    /// Saves the memo draft of the selected experiment.
    pub async fn save_memo(&self) -> ApiResult<ExperimentView> {
        let (exp_id, memo) = {
            let state = read_state(&self.state);
            let selected = state.selected.as_ref().ok_or_else(ApiError::no_experiment_selected)?;
            (selected.id.clone(), state.memo.clone())
        };

        let view = if self.source.is_mock() {
            let mut view = self.selected().ok_or_else(ApiError::no_experiment_selected)?;
            view.memo = memo;
            view
        } else {
            let detail = api::update_experiment_memo(&self.client, &exp_id, &memo).await?;
            ExperimentView::from(&detail)
        };

        let mut state = write_state(&self.state);
        if let Some(slot) = state.experiments.iter_mut().find(|e| e.id == exp_id) {
            *slot = view.clone();
        }
        if state.selected.as_ref().map_or(false, |s| s.id == exp_id) {
            state.memo = view.memo.clone();
            state.selected = Some(view.clone());
        }
        Ok(view)
    }

    fn experiment(&self, exp_id: &str) -> Option<ExperimentView> {
        read_state(&self.state).experiments.iter().find(|e| e.id == exp_id).cloned()
    }

    /// Applies `f` to the reagent list of the selected experiment and of its
    /// list entry.
    fn modify_reagents<F>(&self, exp_id: &str, f: F)
    where
        F: Fn(&mut Vec<ExperimentReagentView>),
    {
        let mut state = write_state(&self.state);
        if let Some(selected) = state.selected.as_mut().filter(|s| s.id == exp_id) {
            f(&mut selected.reagents);
            let updated = selected.clone();
            if let Some(slot) = state.experiments.iter_mut().find(|e| e.id == exp_id) {
                *slot = updated;
            }
        }
    }
}
