use crate::exporters::{prometheus, JsonExporter, PrometheusExporter};
use crate::snapshot::Exporter;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tally_core::{Metric, Store};
use tracing::{debug, error, warn};

const SELF_PROGRAM: &str = "tally";

/// Counters the server keeps about itself, registered into the same store
/// it exports.
struct SelfMetrics {
    requests: Arc<Metric>,
    uptime: Arc<Metric>,
}

impl SelfMetrics {
    async fn register(store: &Store) -> Self {
        Self {
            requests: store
                .register(Metric::counter("http_requests_total", SELF_PROGRAM, ["handler"]))
                .await,
            uptime: store
                .register(Metric::gauge("uptime_seconds", SELF_PROGRAM, Vec::<String>::new()))
                .await,
        }
    }

    async fn record(&self, handler: &str, uptime_seconds: u64) {
        match self.requests.get_or_create_label_value(&[handler]).await {
            Ok(datum) => datum.inc().await,
            Err(e) => warn!("Failed to record request for '{}': {}", handler, e),
        }

        let empty: [&str; 0] = [];
        match self.uptime.get_or_create_label_value(&empty).await {
            Ok(datum) => datum.set(uptime_seconds as i64).await,
            Err(e) => warn!("Failed to record uptime: {}", e),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    exporter: Arc<Exporter>,
    start_time: Instant,
    self_metrics: Option<Arc<SelfMetrics>>,
}

impl AppState {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            exporter: Arc::new(Exporter::new(store)),
            start_time: Instant::now(),
            self_metrics: None,
        }
    }

    /// Registers `http_requests_total` and `uptime_seconds` under the
    /// `tally` program and keeps them updated on every export request.
    pub async fn with_self_metrics(mut self) -> Self {
        let metrics = SelfMetrics::register(self.exporter.store()).await;
        self.self_metrics = Some(Arc::new(metrics));
        self
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    async fn record(&self, handler: &str) {
        debug!(handler, "export request");
        if let Some(metrics) = &self.self_metrics {
            metrics.record(handler, self.uptime_seconds()).await;
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    uptime_seconds: u64,
    metrics: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/json", get(json_handler))
        .route("/metrics", get(prometheus_handler))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn json_handler(State(state): State<AppState>) -> Response {
    state.record("json").await;
    let snapshot = state.exporter.snapshot().await;

    match JsonExporter::to_string(&snapshot) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!("Failed to render JSON snapshot: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn prometheus_handler(State(state): State<AppState>) -> Response {
    state.record("prometheus").await;
    let snapshot = state.exporter.snapshot().await;
    (
        [(header::CONTENT_TYPE, prometheus::CONTENT_TYPE)],
        PrometheusExporter::format(&snapshot),
    )
        .into_response()
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.uptime_seconds(),
        metrics: state.exporter.store().len().await,
    })
}
