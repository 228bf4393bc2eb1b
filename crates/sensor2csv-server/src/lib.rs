// Server mode - HTTP front end for the ingestion pipeline
//
// Features:
// - Axum HTTP server (HTTP/1.1, HTTP/2)
// - Buffered JSONL/CSV sinks behind a background accumulator
// - Structured logging with tracing
// - Graceful shutdown with a final flush

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sensor2csv_batch::{AccumulatorReport, IngestPipeline};
use sensor2csv_config::RuntimeConfig;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

mod handlers;
mod init;

use handlers::{handle_sensor, health_check, ready_check, stats};
pub use init::{init_pipeline, init_tracing};

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    pub max_payload_bytes: usize,
}

/// Error type that implements IntoResponse
pub(crate) struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request error: {:?}", self.error);
        } else {
            warn!("Request rejected: {}", self.error);
        }
        (
            self.status,
            Json(json!({
                "accepted": false,
                "reason": self.error.to_string(),
            })),
        )
            .into_response()
    }
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }
}

/// Routes served by the ingestion endpoint
pub fn router(state: AppState) -> Router {
    // Bodies above the limit are rejected by the extractor with 413.
    let body_limit = state.max_payload_bytes;

    Router::new()
        .route("/api/sensor", post(handle_sensor))
        .route("/api/stats", get(stats))
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

/// Serve on `listener` until `shutdown` resolves, then drain the pipeline.
///
/// The final flush happens after the HTTP server has stopped accepting
/// requests, so every record acknowledged with 200 is handed to the sinks.
pub async fn serve<F>(
    listener: TcpListener,
    config: &RuntimeConfig,
    shutdown: F,
) -> Result<AccumulatorReport>
where
    F: Future<Output = ()> + Send + 'static,
{
    let pipeline = Arc::new(init_pipeline(config)?);
    let state = AppState {
        pipeline: Arc::clone(&pipeline),
        max_payload_bytes: config.request.max_payload_bytes,
    };
    info!(
        "Max payload size set to {} bytes",
        config.request.max_payload_bytes
    );

    let serve_result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error");

    // Flush even when the server failed, then report the first error.
    let report = tokio::task::spawn_blocking(move || pipeline.shutdown())
        .await
        .context("Pipeline shutdown task failed")?
        .context("Failed to drain pipeline")?;
    serve_result?;

    info!(
        "Pipeline drained: {} flushes, {} records written, {} failed",
        report.flushes, report.records_flushed, report.records_failed
    );
    Ok(report)
}

/// Entry point for server mode with a fully resolved configuration
pub async fn run_with_config(config: RuntimeConfig) -> Result<()> {
    init_tracing(&config);

    let addr = &config.server.listen_addr;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Sensor HTTP endpoint listening on http://{}", addr);
    info!("Routes:");
    info!("  POST http://{}/api/sensor - Sensor reading ingestion", addr);
    info!("  GET  http://{}/api/stats  - Ingestion counters", addr);
    info!("  GET  http://{}/health     - Health check", addr);
    info!("  GET  http://{}/ready      - Readiness check", addr);
    info!("Press Ctrl+C or send SIGTERM to stop");

    serve(listener, &config, shutdown_signal()).await?;

    info!("Server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sensor2csv_batch::{BatchConfig, BatchSink};
    use sensor2csv_core::{Batch, FlushSummary};
    use tower::ServiceExt;

    struct Discard;

    impl BatchSink for Discard {
        fn write_batch(&mut self, batch: Batch) -> FlushSummary {
            FlushSummary {
                batch_len: batch.len(),
                written: batch.len() as u64,
                ..FlushSummary::default()
            }
        }
    }

    fn state(max_payload_bytes: usize) -> AppState {
        let pipeline = IngestPipeline::start(BatchConfig::default(), Discard).unwrap();
        AppState {
            pipeline: Arc::new(pipeline),
            max_payload_bytes,
        }
    }

    async fn post(app: Router, body: &'static str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::post("/api/sensor")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn accepts_valid_reading() {
        let state = state(1024);
        let (status, body) = post(router(state.clone()), r#"{"sequence": 1, "iaq": 42}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"accepted": true}));
        assert_eq!(state.pipeline.stats().received, 1);
    }

    #[tokio::test]
    async fn invalid_reading_is_bad_request_with_reason() {
        let (status, body) = post(router(state(1024)), "[1, 2]").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["accepted"], false);
        assert_eq!(body["reason"], "payload must be a JSON object");
    }

    #[tokio::test]
    async fn oversize_payload_is_rejected() {
        let (status, body) = post(
            router(state(16)),
            r#"{"temperature": 21.5, "humidity": 40.0}"#,
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["accepted"], false);
        assert!(body["reason"].is_string());
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn closed_pipeline_reports_unavailable() {
        let state = state(1024);
        state.pipeline.shutdown().unwrap();

        let (status, body) = post(router(state.clone()), r#"{"sequence": 2}"#).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["accepted"], false);
        assert!(body["reason"].as_str().unwrap().contains("shutting down"));

        let response = router(state)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn stats_endpoint_serves_snapshot() {
        let state = state(1024);
        post(router(state.clone()), r#"{"sequence": 3}"#).await;
        post(router(state.clone()), "nope").await;

        let response = router(state)
            .oneshot(Request::get("/api/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let snap: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(snap["received"], 1);
        assert_eq!(snap["queued"], 1);
        assert!(snap.get("queue_depth").is_some());
    }
}
