// src/api/monitoring.rs
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{
    Accident, AccidentStatus, AccidentUpdateRequest, ConversationLog, EmailLog, MonitoringOverview,
    SafetyStatus, SpeechToken, Verification,
};
use crate::query::ApiQuery;

pub const DEFAULT_LOG_LIMIT: u32 = 100;

/// Optional filters of the accident list.
#[derive(Debug, Clone, Default)]
pub struct AccidentFilter {
    pub status: Option<AccidentStatus>,
    pub from_ts: Option<String>,
    pub to_ts: Option<String>,
    pub limit: Option<u32>,
}

pub async fn fetch_accidents(client: &ApiClient, filter: &AccidentFilter) -> ApiResult<Vec<Accident>> {
    let mut query = ApiQuery::new();
    if let Some(limit) = filter.limit {
        query = query.limit(limit);
    }
    if let Some(status) = filter.status {
        query = query.param("status", status);
    }
    if let Some(from_ts) = &filter.from_ts {
        query = query.param("from_ts", from_ts);
    }
    if let Some(to_ts) = &filter.to_ts {
        query = query.param("to_ts", to_ts);
    }
    client.get(&format!("/api/accidents{}", query.build())).await
}

pub async fn update_accident(client: &ApiClient, accident_id: i64, verification: Verification) -> ApiResult<Accident> {
    client
        .patch(
            &format!("/api/accidents/{}", accident_id),
            &AccidentUpdateRequest::new(verification),
        )
        .await
}

pub async fn fetch_safety_status(client: &ApiClient, limit: u32, page: u32) -> ApiResult<SafetyStatus> {
    let query = ApiQuery::new().limit(limit).param("page", page.max(1)).build();
    client.get(&format!("/api/safety/status{}", query)).await
}

pub async fn fetch_monitoring_overview(client: &ApiClient) -> ApiResult<MonitoringOverview> {
    client.get("/api/monitoring/overview").await
}

pub async fn fetch_conversation_logs(
    client: &ApiClient,
    limit: u32,
    language: Option<&str>,
) -> ApiResult<Vec<ConversationLog>> {
    let mut query = ApiQuery::new().limit(limit);
    if let Some(language) = language {
        query = query.language(language);
    }
    client.get(&format!("/api/logs/conversations{}", query.build())).await
}

pub async fn fetch_email_logs(client: &ApiClient, limit: u32) -> ApiResult<Vec<EmailLog>> {
    let query = ApiQuery::new().limit(limit).build();
    client.get(&format!("/api/logs/emails{}", query)).await
}

/// Short-lived token for the speech service; device access is left to the caller.
pub async fn fetch_speech_token(client: &ApiClient) -> ApiResult<SpeechToken> {
    client.get("/api/speech/token").await
}
