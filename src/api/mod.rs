// src/api/mod.rs

//! HTTP surface for the scanner.
//!
//! Deliberately thin: routing, JSON shaping, and CORS only. All scan and
//! reconciliation behavior lives in the pipeline; malformed client input
//! is rejected here and never reaches the core.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::error::Result;
use crate::models::{Config, ProductRecord};
use crate::pipeline::{ScanSummary, run_scan};
use crate::services::ListingScanner;
use crate::storage::ProductStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub scanner: Arc<ListingScanner>,
    /// Absent in stateless deployments
    pub store: Option<Arc<dyn ProductStore>>,
    /// Serializes scans so store read-modify-write is never interleaved
    pub scan_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        scanner: Arc<ListingScanner>,
        store: Option<Arc<dyn ProductStore>>,
    ) -> Self {
        Self {
            config,
            scanner,
            store,
            scan_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    app: &'static str,
    version: &'static str,
    storage_mode: &'static str,
    endpoints: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    storage_mode: &'static str,
    timestamp: DateTime<Local>,
}

/// Body of a comparison request: the ids the client already knows.
#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub ids: Vec<String>,
}

async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        app: "mlscan",
        version: env!("CARGO_PKG_VERSION"),
        storage_mode: state.config.storage.mode.as_str(),
        endpoints: &[
            "GET /",
            "GET /health",
            "POST /scan",
            "GET /products",
            "POST /compare",
        ],
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthData> {
    Json(HealthData {
        status: "healthy",
        storage_mode: state.config.storage.mode.as_str(),
        timestamp: Local::now(),
    })
}

/// Run one scan and return its summary.
async fn scan(State(state): State<AppState>) -> std::result::Result<Json<ScanSummary>, ApiError> {
    // One scan in flight at a time; concurrent requests queue here.
    let _guard = state.scan_lock.lock().await;

    let store = state.store.as_deref();
    match run_scan(&state.scanner, store, &state.config).await {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => {
            log::error!("Scan failed: {e}");
            Err(ApiError::internal(format!("scan failed: {e}")))
        }
    }
}

/// All stored records grouped by category.
async fn products(
    State(state): State<AppState>,
) -> std::result::Result<Json<BTreeMap<String, Vec<ProductRecord>>>, ApiError> {
    let store = state
        .store
        .as_deref()
        .ok_or_else(|| ApiError::not_found("no product store in stateless mode"))?;

    match store.by_category().await {
        Ok(grouped) => Ok(Json(grouped)),
        Err(e) => {
            log::error!("Store read failed: {e}");
            Err(ApiError::internal(format!("store read failed: {e}")))
        }
    }
}

/// Stored records the client does not already know about.
async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> std::result::Result<Json<BTreeMap<String, Vec<ProductRecord>>>, ApiError> {
    let store = state
        .store
        .as_deref()
        .ok_or_else(|| ApiError::not_found("no product store in stateless mode"))?;

    let client_ids: HashSet<String> = request.ids.into_iter().collect();
    match store.diff_against_ids(&client_ids).await {
        Ok(unknown) => Ok(Json(unknown)),
        Err(e) => {
            log::error!("Store read failed: {e}");
            Err(ApiError::internal(format!("store read failed: {e}")))
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the application router.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/scan", post(scan))
        .route("/products", get(products))
        .route("/compare", post(compare))
        .layer(build_cors())
        .with_state(state)
}

/// Serve the API until interrupted.
pub async fn serve(state: AppState, bind_addr: &str) -> Result<()> {
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    log::info!("API listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for ctrl-c: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => log::error!("Failed to install signal handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    log::info!("Shutdown signal received");
}
