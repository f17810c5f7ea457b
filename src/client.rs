// src/client.rs - HTTP choke point: headers, CSRF, silent refresh, error mapping
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{ApiError, ApiResult, ErrorDetail};
use crate::monitoring::ClientMetrics;
use crate::token_store::{MemoryTokenStore, TokenStore};

pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const TIMEZONE_HEADER: &str = "X-Timezone";
pub const CSRF_COOKIE: &str = "csrf_token";

/// Auth endpoints whose 401 is an answer, not an expired session.
const AUTH_BOOTSTRAP_PATHS: [&str; 5] = [
    "/api/auth/login",
    "/api/auth/signup",
    "/api/auth/dev-login",
    "/api/auth/refresh",
    "/api/auth/logout",
];

// ==================== NAVIGATOR ====================

/// Where the client sends the user when the session cannot be recovered.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn redirect_to_login(&self, login_path: &str);
}

#[derive(Debug, Default)]
pub struct NullNavigator;

impl Navigator for NullNavigator {
    fn current_path(&self) -> String {
        String::new()
    }

    fn redirect_to_login(&self, login_path: &str) {
        log::warn!("Session expired, login required at {}", login_path);
    }
}

/// Remembers every redirect; the current path follows the last one.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    current: RwLock<String>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new(current_path: &str) -> Self {
        Self {
            current: RwLock::new(current_path.to_string()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn set_current_path(&self, path: &str) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = path.to_string();
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn redirect_to_login(&self, login_path: &str) {
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(login_path.to_string());
        self.set_current_path(login_path);
    }
}

// ==================== REQUEST / RESPONSE ====================

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn is_mutating(&self) -> bool {
        matches!(self.method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
    }
}

/// Successful response kept as bytes (CSV downloads).
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl RawResponse {
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RefreshResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    csrf_token: Option<String>,
}

// ==================== CLIENT ====================

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timezone: String,
    login_path: String,
    refresh_path: String,
    cookies: Arc<Jar>,
    csrf_token: RwLock<Option<String>>,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    refresh_lock: tokio::sync::Mutex<()>,
    refresh_generation: AtomicU64,
    metrics: ClientMetrics,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timezone", &self.timezone)
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &Config) -> ApiResult<Self> {
        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(cookies.clone())
            .timeout(Duration::from_secs(config.api.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            timezone: config.api.timezone.clone(),
            login_path: config.session.login_path.clone(),
            refresh_path: config.session.refresh_path.clone(),
            cookies,
            csrf_token: RwLock::new(None),
            tokens: Arc::new(MemoryTokenStore::new()),
            navigator: Arc::new(NullNavigator),
            refresh_lock: tokio::sync::Mutex::new(()),
            refresh_generation: AtomicU64::new(0),
            metrics: ClientMetrics::new(),
        })
    }

    pub fn with_token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn metrics(&self) -> &ClientMetrics {
        &self.metrics
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    // ==================== SESSION MATERIAL ====================

    /// Token stored from the last auth response, else the `csrf_token` cookie.
    pub fn csrf_token(&self) -> Option<String> {
        let stored = self.csrf_token.read().unwrap_or_else(PoisonError::into_inner).clone();
        stored.or_else(|| self.csrf_from_cookie())
    }

    fn csrf_from_cookie(&self) -> Option<String> {
        let url = reqwest::Url::parse(&self.base_url).ok()?;
        let header = self.cookies.cookies(&url)?;
        let header = header.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == CSRF_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
    }

    pub fn set_csrf_token(&self, token: Option<String>) {
        *self.csrf_token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Stores whatever an auth response carried. Absent values leave the
    /// current ones in place.
    pub async fn store_session(
        &self,
        csrf_token: Option<String>,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> ApiResult<()> {
        if csrf_token.is_some() {
            self.set_csrf_token(csrf_token);
        }
        if access_token.is_some() || refresh_token.is_some() {
            self.tokens.set_tokens(access_token, refresh_token).await?;
        }
        Ok(())
    }

    pub async fn clear_session(&self) -> ApiResult<()> {
        self.set_csrf_token(None);
        self.tokens.clear().await
    }

    // ==================== VERBS ====================

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.fetch_json(ApiRequest::new(Method::GET, path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.fetch_json(ApiRequest::new(Method::POST, path).json(body)?).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.fetch_json(ApiRequest::new(Method::PATCH, path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.fetch_json(ApiRequest::new(Method::DELETE, path)).await
    }

    /// Sends `request` and decodes the JSON body. An empty body decodes as `null`.
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.execute(&request).await?;
        let bytes = response.bytes().await?;
        let parsed = if bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_str("null")
        } else {
            serde_json::from_slice(&bytes)
        };
        parsed.map_err(|e| ApiError::Decode(format!("{} {}: {}", request.method, request.path, e)))
    }

    pub async fn fetch_raw(&self, request: ApiRequest) -> ApiResult<RawResponse> {
        let response = self.execute(&request).await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?.to_vec();
        Ok(RawResponse { status, headers, bytes })
    }

    // ==================== PIPELINE ====================

    fn is_bootstrap_path(&self, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        path == self.refresh_path || AUTH_BOOTSTRAP_PATHS.contains(&path)
    }

    async fn execute(&self, request: &ApiRequest) -> ApiResult<reqwest::Response> {
        let generation = self.refresh_generation.load(Ordering::SeqCst);
        let response = self.send_once(request).await?;

        if response.status() != StatusCode::UNAUTHORIZED || self.is_bootstrap_path(&request.path) {
            return self.check_status(response).await;
        }

        log::info!("{} {} returned 401, refreshing session", request.method, request.path);
        if !self.refresh_session(generation).await {
            return Err(self.session_expired());
        }

        self.metrics.increment_retries();
        let retried = self.send_once(request).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            log::warn!("{} {} still unauthorized after refresh", request.method, request.path);
            return Err(self.session_expired());
        }
        self.check_status(retried).await
    }

    async fn send_once(&self, request: &ApiRequest) -> ApiResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(TIMEZONE_HEADER, self.timezone.as_str());

        if request.is_mutating() {
            if let Some(token) = self.csrf_token() {
                builder = builder.header(CSRF_HEADER, token);
            }
        }
        if let Some(access) = self.tokens.access_token().await {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", access));
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        self.metrics.increment_requests();
        let started = Instant::now();
        let result = builder.send().await;
        self.metrics.record_response_time(started.elapsed().as_millis() as u64);

        match result {
            Ok(response) => {
                log::debug!("{} {} -> {}", request.method, request.path, response.status());
                Ok(response)
            }
            Err(e) => {
                self.metrics.increment_errors();
                log::warn!("{} {} failed: {}", request.method, request.path, e);
                Err(ApiError::from(e))
            }
        }
    }

    async fn check_status(&self, response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        self.metrics.increment_errors();
        let text = response.text().await.unwrap_or_default();
        let detail = if text.trim().is_empty() {
            ErrorDetail::Message(format!("Request failed: {}", status.as_u16()))
        } else {
            ErrorDetail::from_body(&text)
        };
        Err(ApiError::Status { status: status.as_u16(), detail })
    }

    /// Single-flight refresh. Returns true when the session is usable again,
    /// either because this call refreshed it or a concurrent one did.
    async fn refresh_session(&self, seen_generation: u64) -> bool {
        let _guard = self.refresh_lock.lock().await;
        if self.refresh_generation.load(Ordering::SeqCst) != seen_generation {
            log::debug!("Session already refreshed by a concurrent request");
            return true;
        }

        self.metrics.increment_refreshes();
        let body = match self.tokens.refresh_token().await {
            Some(token) => serde_json::json!({ "refresh_token": token }),
            None => serde_json::json!({}),
        };
        let request = ApiRequest {
            method: Method::POST,
            path: self.refresh_path.clone(),
            body: Some(body),
            headers: Vec::new(),
        };

        let response = match self.send_once(&request).await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                log::warn!("Session refresh rejected with {}", response.status());
                return false;
            }
            Err(_) => return false,
        };

        let refreshed: RefreshResponse = response.json().await.unwrap_or_default();
        if let Err(e) = self
            .store_session(refreshed.csrf_token, refreshed.access_token, refreshed.refresh_token)
            .await
        {
            log::warn!("Failed to persist refreshed tokens: {}", e);
        }

        self.refresh_generation.fetch_add(1, Ordering::SeqCst);
        log::info!("Session refreshed");
        true
    }

    fn session_expired(&self) -> ApiError {
        if self.navigator.current_path() != self.login_path {
            self.metrics.increment_redirects();
            log::info!("Redirecting to {}", self.login_path);
            self.navigator.redirect_to_login(&self.login_path);
        }
        ApiError::SessionExpired
    }
}
