//! In-memory mock of the BuildTask HTTP API, plus a few diagnostic routes for exercising the
//! load driver (fixed delays, fixed status codes, a throughput ceiling).
use axum::{
    debug_handler,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

pub mod store;

use store::{NewTask, NewTeam, NewUser, Store, StoreError, PRIORITIES, TASK_STATUSES};

pub const REQUESTS: &str = "mock_service_requests_total";

#[derive(Clone, Default)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
    limiters: Arc<RwLock<HashMap<u32, Arc<DefaultDirectRateLimiter>>>>,
}

pub fn app() -> Router {
    router(AppState::default())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", axum::routing::post(register))
        .route("/api/auth/login", axum::routing::post(login))
        .route("/api/auth/check/username/:username", get(check_username))
        .route("/api/auth/check/email/:email", get(check_email))
        .route("/database/users", get(list_users).post(create_user))
        .route("/database/users/:id", get(get_user))
        .route("/database/teams", get(list_teams).post(create_team))
        .route("/database/teams/:id", get(get_team))
        .route("/database/tasks", get(list_tasks).post(create_task))
        .route("/database/tasks/:id", get(get_task))
        .route("/database/task-statuses", get(task_statuses))
        .route("/database/priorities", get(priorities))
        .route("/delay/ms/:delay_ms", get(delay))
        .route("/status/:code", get(status))
        .route("/max/:max_tps", get(max))
        .layer(middleware::from_fn(count_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve in the background. Returns the bound address, so port `0` works.
pub async fn spawn(addr: impl ToSocketAddrs) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    info!("Mock service listening on {local}");

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app()).await {
            error!("Mock service stopped: {err}");
        }
    });

    Ok(local)
}

pub async fn run(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Mock service listening on {}", listener.local_addr()?);
    axum::serve(listener, app()).await
}

async fn count_requests(req: Request, next: Next) -> Response {
    counter!(REQUESTS).increment(1);
    next.run(req).await
}

struct ApiError(StatusCode, &'static str);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(Message { message: self.1 })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError(StatusCode::CONFLICT, msg),
            StoreError::Invalid(msg) => ApiError(StatusCode::BAD_REQUEST, msg),
        }
    }
}

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

#[derive(Serialize)]
struct Availability {
    available: bool,
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct Session {
    token: String,
    username: String,
}

fn not_found() -> ApiError {
    ApiError(StatusCode::NOT_FOUND, "not found")
}

async fn health() -> Json<Message> {
    Json(Message { message: "UP" })
}

/* Auth */

async fn register(
    State(state): State<AppState>,
    Json(new): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.store.write().await.create_user(new)?;
    debug!("Registered {}", user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<Json<Session>, ApiError> {
    let store = state.store.read().await;
    let user = store
        .login(&creds.username, &creds.password)
        .ok_or(ApiError(StatusCode::UNAUTHORIZED, "invalid credentials"))?;

    Ok(Json(Session {
        token: format!("mock-token-{}", user.id),
        username: user.username.clone(),
    }))
}

async fn check_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Json<Availability> {
    let available = !state.store.read().await.username_taken(&username);
    Json(Availability { available })
}

async fn check_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Json<Availability> {
    let available = !state.store.read().await.email_taken(&email);
    Json(Availability { available })
}

/* Database */

async fn list_users(State(state): State<AppState>) -> impl IntoResponse {
    let users = state.store.read().await.users().to_vec();
    Json(users)
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.store.read().await.user(id).cloned();
    user.map(Json).ok_or_else(not_found)
}

async fn create_user(
    State(state): State<AppState>,
    Json(new): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.store.write().await.create_user(new)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_teams(State(state): State<AppState>) -> impl IntoResponse {
    let teams = state.store.read().await.teams().to_vec();
    Json(teams)
}

async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let team = state.store.read().await.team(id).cloned();
    team.map(Json).ok_or_else(not_found)
}

async fn create_team(
    State(state): State<AppState>,
    Json(new): Json<NewTeam>,
) -> Result<impl IntoResponse, ApiError> {
    let team = state.store.write().await.create_team(new)?;
    Ok((StatusCode::CREATED, Json(team)))
}

async fn list_tasks(State(state): State<AppState>) -> impl IntoResponse {
    let tasks = state.store.read().await.tasks().to_vec();
    Json(tasks)
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.store.read().await.task(id).cloned();
    task.map(Json).ok_or_else(not_found)
}

async fn create_task(
    State(state): State<AppState>,
    Json(new): Json<NewTask>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.store.write().await.create_task(new)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn task_statuses() -> impl IntoResponse {
    Json(TASK_STATUSES)
}

async fn priorities() -> impl IntoResponse {
    Json(PRIORITIES)
}

/* Diagnostics */

#[debug_handler]
async fn delay(Path(delay_ms): Path<u64>) {
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

/// Serves `max_tps` requests per second; everything above that gets a 500.
#[debug_handler]
async fn max(State(state): State<AppState>, Path(max_tps): Path<u32>) -> StatusCode {
    let Some(tps) = NonZeroU32::new(max_tps) else {
        return StatusCode::BAD_REQUEST;
    };

    let existing = state.limiters.read().await.get(&max_tps).cloned();
    let limiter = match existing {
        Some(limiter) => limiter,
        None => state
            .limiters
            .write()
            .await
            .entry(max_tps)
            .or_insert_with(|| Arc::new(RateLimiter::direct(Quota::per_second(tps))))
            .clone(),
    };

    match limiter.check() {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
