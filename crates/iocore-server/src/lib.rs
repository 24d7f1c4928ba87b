//! HTTP host for the iocore collector.
//!
//! Serves the metric catalog, the config policy and on-demand collection
//! cycles as JSON. Every cycle runs under one lock around the collector.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use iocore_core::{CollectorConfig, IoCoreCollector, MetricSample, Namespace};

/// Shared server state.
struct AppState {
    collector: Mutex<CollectorHealth>,
    config: CollectorConfig,
}

/// The collector plus bookkeeping about its last cycle.
struct CollectorHealth {
    collector: IoCoreCollector,
    cycles: u64,
    failures: u64,
    last_error: Option<String>,
}

#[derive(Deserialize)]
struct MetricsParams {
    /// Comma-separated namespaces; the whole catalog when absent.
    ns: Option<String>,
}

#[derive(Serialize)]
struct MetricsResponse {
    success: bool,
    metrics: Vec<MetricSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    vhost_path: String,
    cycles: u64,
    failures: u64,
    first_sample: bool,
    cores: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
}

/// Parse the `ns` query parameter.
fn parse_requested(raw: Option<&str>) -> Result<Vec<Namespace>, String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(IoCoreCollector::catalog_namespaces());
    };
    raw.split(',')
        .map(|s| s.parse::<Namespace>().map_err(|e| e.to_string()))
        .collect()
}

fn failure(status: StatusCode, message: String) -> (StatusCode, Json<MetricsResponse>) {
    (
        status,
        Json(MetricsResponse {
            success: false,
            metrics: Vec::new(),
            error: Some(message),
        }),
    )
}

async fn handle_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetricsParams>,
) -> (StatusCode, Json<MetricsResponse>) {
    let requested = match parse_requested(params.ns.as_deref()) {
        Ok(r) => r,
        Err(e) => return failure(StatusCode::BAD_REQUEST, e),
    };

    let mut guard = state.collector.lock().await;
    guard.cycles += 1;
    let result = guard.collector.collect_from(&state.config, &requested);
    match result {
        Ok(metrics) => {
            guard.last_error = None;
            (
                StatusCode::OK,
                Json(MetricsResponse {
                    success: true,
                    metrics,
                    error: None,
                }),
            )
        }
        Err(e) => {
            log::warn!("collection failed: {e}");
            guard.failures += 1;
            guard.last_error = Some(e.to_string());
            failure(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let guard = state.collector.lock().await;
    Json(HealthResponse {
        status: if guard.last_error.is_none() {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        vhost_path: state.config.vhost_path.display().to_string(),
        cycles: guard.cycles,
        failures: guard.failures,
        first_sample: guard.collector.is_first_sample(),
        cores: guard.collector.current().cores.len(),
        last_error: guard.last_error.clone(),
    })
}

async fn handle_catalog() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "meta": IoCoreCollector::meta(),
        "metrics": IoCoreCollector::metric_types(),
    }))
}

async fn handle_policy() -> Json<serde_json::Value> {
    Json(serde_json::json!(IoCoreCollector::config_policy()))
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let catalog: Vec<String> = IoCoreCollector::catalog_namespaces()
        .iter()
        .map(ToString::to_string)
        .collect();

    Json(serde_json::json!({
        "name": "iocore server",
        "version": iocore_core::VERSION,
        "vhost_path": state.config.vhost_path.display().to_string(),
        "endpoints": {
            "/": "This API index",
            "/metrics": {
                "method": "GET",
                "description": "Run one collection cycle",
                "params": {
                    "ns": format!("Comma-separated namespaces (default: {})", catalog.join(",")),
                }
            },
            "/catalog": "Metric types exposed by the collector",
            "/policy": "Accepted configuration options",
            "/health": "Outcome of the last collection cycle",
        },
        "examples": {
            "all": "/metrics",
            "utilization": "/metrics?ns=/ibm/sysfs/iocore/*/cpu_utilization",
        }
    }))
}

/// Build the axum router.
fn build_router(config: CollectorConfig) -> Router {
    let state = Arc::new(AppState {
        collector: Mutex::new(CollectorHealth {
            collector: IoCoreCollector::new(),
            cycles: 0,
            failures: 0,
            last_error: None,
        }),
        config,
    });

    Router::new()
        .route("/", get(handle_index))
        .route("/metrics", get(handle_metrics))
        .route("/catalog", get(handle_catalog))
        .route("/policy", get(handle_policy))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the HTTP server until the listener fails.
pub async fn run_server(config: CollectorConfig, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(config);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");
    axum::serve(listener, app).await
}
