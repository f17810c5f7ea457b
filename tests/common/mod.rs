// tests/common/mod.rs - In-process backend for integration tests
#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};

use labdash::{ApiClient, Config, MemoryTokenStore, RecordingNavigator};

pub const TIMEZONE: &str = "Asia/Seoul";
pub const ISSUED_ACCESS: &str = "access-1";
pub const REFRESHED_ACCESS: &str = "access-2";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub csrf: Option<String>,
    pub timezone: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Shared state behind every route.
#[derive(Debug, Default)]
pub struct BackendState {
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub valid_token: Mutex<String>,
    /// Refresh answers 401 when false.
    pub refresh_succeeds: AtomicBool,
    /// Refresh answers 200 but the new token is still rejected.
    pub revoke_all: AtomicBool,
    pub refresh_calls: AtomicUsize,
    pub rooms: Mutex<Vec<Value>>,
    pub rooms_created: AtomicUsize,
    pub fail_dispose: AtomicBool,
    /// Milliseconds the dispose route waits before answering.
    pub dispose_delay_ms: AtomicU64,
}

impl BackendState {
    fn record(&self, req: &HttpRequest, body: &web::Bytes) {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let body = serde_json::from_slice(body).unwrap_or(Value::Null);
        self.requests.lock().unwrap().push(RecordedRequest {
            method: req.method().to_string(),
            path: req.path().to_string(),
            csrf: header("X-CSRF-Token"),
            timezone: header("X-Timezone"),
            authorization: header("Authorization"),
            body,
        });
    }

    fn authorized(&self, req: &HttpRequest) -> bool {
        let expected = format!("Bearer {}", self.valid_token.lock().unwrap());
        req.headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == expected)
            .unwrap_or(false)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
}

impl MockBackend {
    /// Binds an ephemeral port and serves on the current actix system.
    pub fn start() -> Self {
        let state = Arc::new(BackendState {
            refresh_succeeds: AtomicBool::new(true),
            valid_token: Mutex::new(ISSUED_ACCESS.to_string()),
            ..Default::default()
        });
        let data = web::Data::from(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .service(
                    web::scope("/api/auth")
                        .route("/login", web::post().to(login))
                        .route("/refresh", web::post().to(refresh))
                        .route("/logout", web::post().to(logout))
                        .route("/me", web::get().to(me)),
                )
                .service(
                    web::scope("/api/reagents")
                        .route("", web::get().to(list_reagents))
                        .route("/disposals", web::get().to(list_disposals))
                        .route("/storage-environment", web::get().to(storage_environment))
                        .route("/{id}/dispose", web::post().to(dispose_reagent)),
                )
                .service(
                    web::scope("/api/chat/rooms")
                        .route("", web::get().to(list_rooms))
                        .route("", web::post().to(create_room))
                        .route("/{id}/messages", web::get().to(list_messages))
                        .route("/{id}/messages", web::post().to(post_message)),
                )
                .service(
                    web::scope("/api/users")
                        .route("/{id}", web::patch().to(update_user))
                        .route("/{id}", web::delete().to(delete_user)),
                )
                .route("/api/export/{kind}", web::get().to(export_csv))
        })
        .workers(1)
        .listen(listener)
        .unwrap()
        .run();
        actix_rt::spawn(server);

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    pub fn config(&self) -> Config {
        let mut config = Config::for_base_url(&self.base_url);
        config.api.timezone = TIMEZONE.to_string();
        config
    }

    /// Client holding `access`/`refresh` tokens and a navigator on `/dashboard`.
    pub fn client(&self, access: &str, refresh: &str) -> (Arc<ApiClient>, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::new("/dashboard"));
        let client = ApiClient::new(&self.config())
            .unwrap()
            .with_token_store(Arc::new(MemoryTokenStore::with_tokens(access, refresh)))
            .with_navigator(navigator.clone());
        (Arc::new(client), navigator)
    }

    pub fn signed_in_client(&self) -> (Arc<ApiClient>, Arc<RecordingNavigator>) {
        self.client(ISSUED_ACCESS, "refresh-1")
    }
}

// ==================== HANDLERS ====================

type State = web::Data<BackendState>;

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({ "detail": "Not authenticated" }))
}

fn sample_user() -> Value {
    json!({
        "id": 7,
        "email": "kim@lab.io",
        "name": "Dr. Kim",
        "role": "admin",
        "isActive": true
    })
}

async fn login(req: HttpRequest, body: web::Bytes, state: State) -> HttpResponse {
    state.record(&req, &body);
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    if payload["password"] != "Test1234" {
        return HttpResponse::Unauthorized().json(json!({ "detail": "Invalid credentials" }));
    }
    *state.valid_token.lock().unwrap() = ISSUED_ACCESS.to_string();
    HttpResponse::Ok().json(json!({
        "token_type": "bearer",
        "access_token": ISSUED_ACCESS,
        "refresh_token": "refresh-1",
        "expires_in": 3600,
        "csrf_token": "csrf-1",
        "user": sample_user()
    }))
}

async fn refresh(req: HttpRequest, body: web::Bytes, state: State) -> HttpResponse {
    state.record(&req, &body);
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if !state.refresh_succeeds.load(Ordering::SeqCst) {
        return unauthorized();
    }
    if !state.revoke_all.load(Ordering::SeqCst) {
        *state.valid_token.lock().unwrap() = REFRESHED_ACCESS.to_string();
    }
    HttpResponse::Ok().json(json!({
        "access_token": REFRESHED_ACCESS,
        "csrf_token": "csrf-2"
    }))
}

async fn logout(req: HttpRequest, body: web::Bytes, state: State) -> HttpResponse {
    state.record(&req, &body);
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn me(req: HttpRequest, body: web::Bytes, state: State) -> HttpResponse {
    state.record(&req, &body);
    if !state.authorized(&req) {
        return unauthorized();
    }
    HttpResponse::Ok().json(sample_user())
}

async fn list_reagents(req: HttpRequest, body: web::Bytes, state: State) -> HttpResponse {
    state.record(&req, &body);
    if !state.authorized(&req) {
        return unauthorized();
    }
    HttpResponse::Ok().json(json!({
        "items": [
            {
                "id": "R1", "name": "Sulfuric acid", "formula": "H2SO4",
                "currentVolume": {"value": 450, "unit": "ml"},
                "originalVolume": {"value": 500, "unit": "ml"},
                "purity": 98, "location": "Cabinet A", "status": "normal"
            },
            {
                "id": "R2", "name": "Sodium hydroxide", "formula": "NaOH",
                "currentVolume": {"value": 20, "unit": "g"},
                "originalVolume": {"value": 500, "unit": "g"},
                "purity": 97, "location": "Cabinet B", "status": "low"
            }
        ],
        "nextCursor": null
    }))
}

async fn list_disposals(req: HttpRequest, body: web::Bytes, state: State) -> HttpResponse {
    state.record(&req, &body);
    HttpResponse::Ok().json(json!({ "items": [], "nextCursor": null }))
}

async fn storage_environment(req: HttpRequest, body: web::Bytes, state: State) -> HttpResponse {
    state.record(&req, &body);
    HttpResponse::Ok().json(json!({
        "items": [{ "location": "Cabinet A", "temp": 21.5, "humidity": 40.0, "status": "normal" }]
    }))
}

async fn dispose_reagent(req: HttpRequest, body: web::Bytes, path: web::Path<String>, state: State) -> HttpResponse {
    state.record(&req, &body);
    let delay = state.dispose_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        actix_rt::time::sleep(Duration::from_millis(delay)).await;
    }
    if state.fail_dispose.load(Ordering::SeqCst) {
        return HttpResponse::InternalServerError().json(json!({ "detail": "Disposal failed" }));
    }
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    HttpResponse::Ok().json(json!({
        "id": "D1",
        "name": format!("Reagent {}", path.into_inner()),
        "formula": "H2SO4",
        "disposalDate": "2026-02-01",
        "reason": payload["reason"],
        "disposedBy": payload["disposed_by"].as_str().or(payload["disposedBy"].as_str()).unwrap_or("")
    }))
}

async fn update_user(req: HttpRequest, body: web::Bytes, path: web::Path<i64>, state: State) -> HttpResponse {
    state.record(&req, &body);
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let mut user = sample_user();
    user["id"] = json!(path.into_inner());
    if let Some(name) = payload["name"].as_str() {
        user["name"] = json!(name);
    }
    HttpResponse::Ok().json(user)
}

async fn delete_user(req: HttpRequest, body: web::Bytes, state: State) -> HttpResponse {
    state.record(&req, &body);
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn list_rooms(req: HttpRequest, body: web::Bytes, state: State) -> HttpResponse {
    state.record(&req, &body);
    let rooms = state.rooms.lock().unwrap().clone();
    HttpResponse::Ok().json(json!({ "items": rooms, "nextCursor": null }))
}

async fn create_room(req: HttpRequest, body: web::Bytes, state: State) -> HttpResponse {
    state.record(&req, &body);
    let n = state.rooms_created.fetch_add(1, Ordering::SeqCst) + 1;
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let room = json!({
        "id": format!("room-{}", n),
        "title": payload["title"],
        "roomType": "public",
        "createdAt": "2026-02-01T09:00:00",
        "lastMessageAt": null,
        "lastMessagePreview": null
    });
    state.rooms.lock().unwrap().insert(0, room.clone());
    HttpResponse::Ok().json(room)
}

async fn list_messages(req: HttpRequest, body: web::Bytes, state: State) -> HttpResponse {
    state.record(&req, &body);
    HttpResponse::Ok().json(json!({ "items": [], "nextCursor": null }))
}

async fn post_message(req: HttpRequest, body: web::Bytes, path: web::Path<String>, state: State) -> HttpResponse {
    state.record(&req, &body);
    let room_id = path.into_inner();
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let content = payload["message"].as_str().unwrap_or_default().to_string();
    HttpResponse::Ok().json(json!({
        "userMessage": {
            "id": "m-1", "roomId": room_id, "role": "user", "content": content,
            "createdAt": "2026-02-01T09:00:01", "senderType": "guest",
            "senderId": null, "senderName": payload["user"]
        },
        "assistantMessage": {
            "id": "m-2", "roomId": room_id, "role": "assistant",
            "content": format!("Echo: {}", content),
            "createdAt": "2026-02-01T09:00:02", "senderType": "assistant",
            "senderId": null, "senderName": null
        }
    }))
}

async fn export_csv(req: HttpRequest, body: web::Bytes, path: web::Path<String>, state: State) -> HttpResponse {
    state.record(&req, &body);
    let kind = path.into_inner();
    let csv = "\u{FEFF}id,title,status\n1,Spill,active\n2,Fall,resolved\n";
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}_20260201.csv\"", kind.replace('-', "_")),
        ))
        .body(csv)
}
