// src/api/auth.rs
use reqwest::Method;
use serde_json::json;
use validator::Validate;

use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiResult;
use crate::models::{LoginRequest, LoginResponse, SignupRequest, StatusResponse, User, UserSelfUpdateRequest};

pub const DEV_LOGIN_SECRET_HEADER: &str = "X-Dev-Login-Secret";

async fn persist_session(client: &ApiClient, response: &LoginResponse) -> ApiResult<()> {
    client
        .store_session(
            response.csrf_token.clone(),
            response.access_token.clone(),
            response.refresh_token.clone(),
        )
        .await
}

pub async fn login(client: &ApiClient, payload: &LoginRequest) -> ApiResult<LoginResponse> {
    payload.validate()?;
    let response: LoginResponse = client.post("/api/auth/login", payload).await?;
    persist_session(client, &response).await?;
    log::info!("Logged in as {}", response.user.email);
    Ok(response)
}

pub async fn signup(client: &ApiClient, payload: &SignupRequest) -> ApiResult<LoginResponse> {
    payload.validate()?;
    let response: LoginResponse = client.post("/api/auth/signup", payload).await?;
    persist_session(client, &response).await?;
    log::info!("Signed up {}", response.user.email);
    Ok(response)
}

/// Passwordless login for development backends.
pub async fn dev_login(client: &ApiClient, secret: Option<&str>) -> ApiResult<LoginResponse> {
    let mut request = ApiRequest::new(Method::POST, "/api/auth/dev-login");
    if let Some(secret) = secret.filter(|s| !s.is_empty()) {
        request = request.header(DEV_LOGIN_SECRET_HEADER, secret);
    }
    let response: LoginResponse = client.fetch_json(request).await?;
    persist_session(client, &response).await?;
    Ok(response)
}

pub async fn fetch_current_user(client: &ApiClient) -> ApiResult<User> {
    client.get("/api/auth/me").await
}

pub async fn update_profile(client: &ApiClient, payload: &UserSelfUpdateRequest) -> ApiResult<User> {
    payload.validate()?;
    client.patch("/api/auth/me", payload).await
}

/// Ends the backend session. Local tokens are cleared whatever the outcome.
pub async fn logout(client: &ApiClient) -> ApiResult<StatusResponse> {
    let mut request = ApiRequest::new(Method::POST, "/api/auth/logout");
    if let Some(refresh_token) = client.token_store().refresh_token().await {
        request = request.json(&json!({ "refresh_token": refresh_token }))?;
    }
    let result = client.fetch_json::<Option<StatusResponse>>(request).await;
    client.clear_session().await?;
    Ok(result?.unwrap_or_default())
}

/// Deletes the signed-in account. Local tokens are cleared whatever the outcome.
pub async fn delete_account(client: &ApiClient) -> ApiResult<StatusResponse> {
    let result = client.delete::<Option<StatusResponse>>("/api/auth/me").await;
    client.clear_session().await?;
    Ok(result?.unwrap_or_default())
}
