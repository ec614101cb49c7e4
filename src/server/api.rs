//! Weight store HTTP API.
//!
//! Implements the service surface client processes use instead of raw
//! calls:
//! - PUT /v1/weights/{name}        store a weight (body = raw bytes)
//! - GET /v1/weights/{name}        fetch a stored weight
//! - GET /v1/weights/{name}/size   query the stored size
//! - GET /v1/store/stats           store statistics
//! - GET /health
//! - GET /metrics                  Prometheus exposition

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::boundary::copy::UserRange;
use crate::boundary::vm::VmSpace;
use crate::config::Config;
use crate::metrics::StoreMetrics;
use crate::store::registry::{StoreError, StoreStats, WeightStore};

/// Base address request bodies are mapped at inside the per-request caller
/// space.
const USER_BASE: u64 = 0x1000;

/// Application state shared across handlers.
pub struct AppState {
    pub store: Arc<WeightStore>,
    pub config: Arc<Config>,
    pub metrics: StoreMetrics,
    pub start_time: Instant,
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_blob_bytes;

    Router::new()
        .route("/v1/weights/{name}", put(store_weight).get(fetch_weight))
        .route("/v1/weights/{name}/size", get(weight_size))
        .route("/v1/store/stats", get(store_stats))
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

/// A stored weight's identity and size.
#[derive(Debug, Serialize)]
pub struct WeightInfo {
    pub name: String,
    pub size: usize,
}

/// Store statistics response.
#[derive(Debug, Serialize)]
pub struct StoreStatsResponse {
    pub blobs: usize,
    pub bytes_stored: usize,
    pub pages_live: usize,
    pub page_size: usize,
}

impl From<StoreStats> for StoreStatsResponse {
    fn from(stats: StoreStats) -> Self {
        Self {
            blobs: stats.blobs,
            bytes_stored: stats.bytes_stored,
            pages_live: stats.pages_live,
            page_size: stats.page_size,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub store: StoreStatsResponse,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(err: &StoreError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        StoreError::InvalidName(_) => StatusCode::BAD_REQUEST,
        StoreError::AlreadyExists(_) => StatusCode::CONFLICT,
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::BufferTooSmall { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        StoreError::Allocation(_) => StatusCode::INSUFFICIENT_STORAGE,
        StoreError::Copy(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn store_weight(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let size = body.len();

    info!(request_id, name, size, "store weight request");

    // Map the body into a fresh caller space; the store pulls it across
    // the copy boundary page by page.
    let vm = VmSpace::from_bytes(USER_BASE, body.to_vec());
    match state.store.put(&name, UserRange::new(USER_BASE, size), &vm) {
        Ok(()) => {
            state.metrics.puts_total.inc();
            state.metrics.observe_store(&state.store.stats());
            (StatusCode::CREATED, Json(WeightInfo { name, size })).into_response()
        }
        Err(err) => {
            state.metrics.put_failures_total.inc();
            error_response(&err).into_response()
        }
    }
}

async fn fetch_weight(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    info!(request_id, name, "fetch weight request");

    // Probe the stored size, then copy into a caller space of exactly that
    // size. Entries are immutable, so the size cannot change in between.
    let mut probe = VmSpace::new(0, 0);
    let size = match state.store.get(&name, UserRange::query(), &mut probe) {
        Ok(size) => size,
        Err(err) => {
            state.metrics.load_failures_total.inc();
            return error_response(&err).into_response();
        }
    };

    let mut vm = VmSpace::new(USER_BASE, size);
    if size > 0 {
        if let Err(err) = state
            .store
            .get(&name, UserRange::new(USER_BASE, size), &mut vm)
        {
            state.metrics.load_failures_total.inc();
            return error_response(&err).into_response();
        }
    }

    state.metrics.loads_total.inc();
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        vm.into_bytes(),
    )
        .into_response()
}

async fn weight_size(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let mut probe = VmSpace::new(0, 0);
    match state.store.get(&name, UserRange::query(), &mut probe) {
        Ok(size) => {
            state.metrics.loads_total.inc();
            (StatusCode::OK, Json(WeightInfo { name, size })).into_response()
        }
        Err(err) => {
            state.metrics.load_failures_total.inc();
            error_response(&err).into_response()
        }
    }
}

async fn store_stats(State(state): State<Arc<AppState>>) -> Json<StoreStatsResponse> {
    Json(state.store.stats().into())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        store: state.store.stats().into(),
    })
}

async fn metrics_text(State(state): State<Arc<AppState>>) -> Response {
    state.metrics.observe_store(&state.store.stats());
    match state.metrics.render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}
