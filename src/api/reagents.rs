// src/api/reagents.rs
use serde_json::Value;
use validator::Validate;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{
    ListResponse, ReagentCreateRequest, ReagentDisposal, ReagentDisposalCreateRequest, ReagentItem,
    ReagentUpdateRequest, StatusResponse, StorageEnvironmentResponse,
};
use crate::query::{encode_path_segment, ApiQuery};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

fn reagent_path(reagent_id: &str) -> String {
    format!("/api/reagents/{}", encode_path_segment(reagent_id))
}

pub async fn fetch_reagents(
    client: &ApiClient,
    limit: u32,
    cursor: Option<&str>,
    language: Option<&str>,
) -> ApiResult<ListResponse<ReagentItem>> {
    let mut query = ApiQuery::new().limit(limit).cursor(cursor);
    if let Some(language) = language {
        query = query.language(language);
    }
    client.get(&format!("/api/reagents{}", query.build())).await
}

pub async fn fetch_reagent(client: &ApiClient, reagent_id: &str) -> ApiResult<ReagentItem> {
    client.get(&reagent_path(reagent_id)).await
}

pub async fn create_reagent(client: &ApiClient, payload: &ReagentCreateRequest) -> ApiResult<ReagentItem> {
    payload.validate()?;
    client.post("/api/reagents", payload).await
}

pub async fn update_reagent(
    client: &ApiClient,
    reagent_id: &str,
    payload: &ReagentUpdateRequest,
) -> ApiResult<ReagentItem> {
    payload.validate()?;
    client.patch(&reagent_path(reagent_id), payload).await
}

pub async fn dispose_reagent(
    client: &ApiClient,
    reagent_id: &str,
    payload: &ReagentDisposalCreateRequest,
) -> ApiResult<ReagentDisposal> {
    payload.validate()?;
    client
        .post(&format!("{}/dispose", reagent_path(reagent_id)), payload)
        .await
}

/// Moves a disposed reagent back into the active inventory.
pub async fn restore_reagent(client: &ApiClient, reagent_id: &str) -> ApiResult<ReagentItem> {
    client
        .post(&format!("{}/restore", reagent_path(reagent_id)), &serde_json::json!({}))
        .await
}

pub async fn delete_reagent_permanently(client: &ApiClient, reagent_id: &str) -> ApiResult<Option<StatusResponse>> {
    client.delete(&reagent_path(reagent_id)).await
}

pub async fn fetch_disposals(
    client: &ApiClient,
    limit: u32,
    cursor: Option<&str>,
) -> ApiResult<ListResponse<ReagentDisposal>> {
    let query = ApiQuery::new().limit(limit).cursor(cursor).build();
    client.get(&format!("/api/reagents/disposals{}", query)).await
}

pub async fn clear_all_disposals(client: &ApiClient) -> ApiResult<Option<StatusResponse>> {
    client.delete("/api/reagents/disposals").await
}

pub async fn fetch_storage_environment(client: &ApiClient) -> ApiResult<StorageEnvironmentResponse> {
    client.get("/api/reagents/storage-environment").await
}

/// Hazard and handling data for a chemical name. The payload shape is
/// owned by an upstream database, so it stays untyped.
pub async fn search_hazard_info(client: &ApiClient, chem_name: &str) -> ApiResult<Value> {
    let query = ApiQuery::new().param("chem_name", chem_name).build();
    client.get(&format!("/api/reagents/hazard-info{}", query)).await
}
