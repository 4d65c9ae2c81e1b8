//! HTTP server for exposing Prometheus metrics
//!
//! Runs on a separate port (METRICS_PORT, default 9090) next to the
//! registration web app.

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Start the metrics HTTP server
///
/// Exposes:
/// - /metrics - Prometheus metrics in text format
/// - /health  - health check
pub async fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler));

    log::info!("Starting metrics server on http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Handler for /metrics
async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", encoder.format_type().to_string())],
            buffer,
        ),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain".to_string())],
                Vec::new(),
            )
        }
    }
}

/// Handler for /health
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
