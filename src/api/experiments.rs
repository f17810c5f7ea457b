// src/api/experiments.rs
use serde_json::json;
use validator::Validate;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{
    ExperimentCreateRequest, ExperimentDetail, ExperimentReagent, ExperimentReagentCreateRequest,
    ExperimentStatus, ExperimentSummary, ExperimentUpdateRequest, ListResponse, StatusResponse,
};
use crate::query::{encode_path_segment, ApiQuery};

/// Filters for the experiment list.
#[derive(Debug, Clone, Default)]
pub struct ExperimentListParams {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub language: Option<String>,
    pub status: Option<ExperimentStatus>,
}

fn experiment_path(exp_id: &str) -> String {
    format!("/api/experiments/{}", encode_path_segment(exp_id))
}

pub async fn fetch_experiments(
    client: &ApiClient,
    params: &ExperimentListParams,
) -> ApiResult<ListResponse<ExperimentSummary>> {
    let mut query = ApiQuery::new()
        .limit(params.limit.unwrap_or(50))
        .cursor(params.cursor.as_deref());
    if let Some(language) = &params.language {
        query = query.language(language);
    }
    if let Some(status) = params.status {
        query = query.param("status", status);
    }
    client.get(&format!("/api/experiments{}", query.build())).await
}

pub async fn fetch_experiment_detail(
    client: &ApiClient,
    exp_id: &str,
    language: Option<&str>,
) -> ApiResult<ExperimentDetail> {
    let query = match language {
        Some(language) => ApiQuery::new().language(language).build(),
        None => String::new(),
    };
    client.get(&format!("{}{}", experiment_path(exp_id), query)).await
}

pub async fn create_experiment(client: &ApiClient, payload: &ExperimentCreateRequest) -> ApiResult<ExperimentDetail> {
    payload.validate()?;
    client.post("/api/experiments", payload).await
}

pub async fn update_experiment(
    client: &ApiClient,
    exp_id: &str,
    payload: &ExperimentUpdateRequest,
) -> ApiResult<ExperimentDetail> {
    payload.validate()?;
    client.patch(&experiment_path(exp_id), payload).await
}

pub async fn update_experiment_memo(client: &ApiClient, exp_id: &str, memo: &str) -> ApiResult<ExperimentDetail> {
    client.patch(&experiment_path(exp_id), &json!({ "memo": memo })).await
}

pub async fn delete_experiment(client: &ApiClient, exp_id: &str) -> ApiResult<Option<StatusResponse>> {
    client.delete(&experiment_path(exp_id)).await
}

pub async fn add_experiment_reagent(
    client: &ApiClient,
    exp_id: &str,
    payload: &ExperimentReagentCreateRequest,
) -> ApiResult<ExperimentReagent> {
    client
        .post(&format!("{}/reagents", experiment_path(exp_id)), payload)
        .await
}

pub async fn remove_experiment_reagent(
    client: &ApiClient,
    exp_id: &str,
    exp_reagent_id: &str,
) -> ApiResult<Option<StatusResponse>> {
    client
        .delete(&format!(
            "{}/reagents/{}",
            experiment_path(exp_id),
            encode_path_segment(exp_reagent_id)
        ))
        .await
}
