// src/api/users.rs
use validator::Validate;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{
    AuthLogListResponse, CountedListResponse, PasswordResetRequest, StatusResponse, User, UserCreateRequest,
    UserUpdateRequest,
};
use crate::query::ApiQuery;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_AUTH_LOG_LIMIT: u32 = 10;

pub async fn fetch_users(
    client: &ApiClient,
    limit: u32,
    cursor: Option<&str>,
) -> ApiResult<CountedListResponse<User>> {
    let query = ApiQuery::new().limit(limit).cursor(cursor).build();
    client.get(&format!("/api/users{}", query)).await
}

pub async fn fetch_user(client: &ApiClient, user_id: i64) -> ApiResult<User> {
    client.get(&format!("/api/users/{}", user_id)).await
}

pub async fn create_user(client: &ApiClient, payload: &UserCreateRequest) -> ApiResult<User> {
    payload.validate()?;
    client.post("/api/users", payload).await
}

pub async fn update_user(client: &ApiClient, user_id: i64, payload: &UserUpdateRequest) -> ApiResult<User> {
    payload.validate()?;
    client.patch(&format!("/api/users/{}", user_id), payload).await
}

/// Deactivates the account; the row is kept.
pub async fn delete_user(client: &ApiClient, user_id: i64) -> ApiResult<Option<StatusResponse>> {
    client.delete(&format!("/api/users/{}", user_id)).await
}

pub async fn delete_user_hard(client: &ApiClient, user_id: i64) -> ApiResult<Option<StatusResponse>> {
    client.delete(&format!("/api/users/{}/hard", user_id)).await
}

pub async fn reset_user_password(client: &ApiClient, user_id: i64, password: &str) -> ApiResult<Option<StatusResponse>> {
    let payload = PasswordResetRequest {
        password: password.to_string(),
    };
    payload.validate()?;
    client
        .patch(&format!("/api/users/{}/password", user_id), &payload)
        .await
}

pub async fn fetch_user_auth_logs(client: &ApiClient, user_id: i64, limit: u32) -> ApiResult<AuthLogListResponse> {
    let query = ApiQuery::new().limit(limit).build();
    client
        .get(&format!("/api/users/{}/auth-logs{}", user_id, query))
        .await
}

pub async fn delete_user_auth_logs(client: &ApiClient, user_id: i64) -> ApiResult<Option<StatusResponse>> {
    client.delete(&format!("/api/users/{}/auth-logs", user_id)).await
}

pub async fn delete_all_user_auth_logs(client: &ApiClient) -> ApiResult<Option<StatusResponse>> {
    client.delete("/api/users/auth-logs").await
}
