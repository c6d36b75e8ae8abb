use crate::config::Config;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tally_core::Store;
use tally_exporter::{router, AppState};
use tracing::{info, warn};

pub async fn execute(config: Config) -> Result<()> {
    let store = Arc::new(Store::new());

    let declared = config.register(&store).await;
    info!("Registered {} declared metrics", declared.len());

    let mut state = AppState::new(Arc::clone(&store));
    if config.self_metrics {
        state = state.with_self_metrics().await;
    } else {
        info!("Self metrics disabled");
    }
    let app = router(state);

    if config.summary_interval.is_zero() {
        info!("Periodic summary disabled");
    } else {
        tokio::spawn(log_summary(Arc::clone(&store), config.summary_interval));
    }

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("Starting tally exporter on {}", config.listen);
    info!("Endpoints:");
    info!("  GET  /json     - Registry snapshot (JSON)");
    info!("  GET  /metrics  - Prometheus text exposition");
    info!("  GET  /health   - Health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Exporter stopped");
    Ok(())
}

async fn log_summary(store: Arc<Store>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;

        let metrics = store.metrics().await;
        let mut series = 0;
        for metric in &metrics {
            series += metric.label_value_count().await;
        }
        info!(metrics = metrics.len(), series, "registry summary");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
