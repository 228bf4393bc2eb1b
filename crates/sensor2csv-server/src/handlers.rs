// HTTP request handlers for server mode
//
// Sensor ingestion, counters, and health check endpoints

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::{counter, histogram};
use sensor2csv_core::{IngestError, Record};
use serde_json::json;
use tracing::debug;

use crate::{AppError, AppState};

/// POST /api/sensor - Single sensor reading as a JSON object
pub(crate) async fn handle_sensor(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let body = body.map_err(|rejection| {
        counter!("sensor.ingest.rejected", 1);
        AppError::with_status(rejection.status(), anyhow::anyhow!(rejection.body_text()))
    })?;

    counter!("sensor.ingest.requests", 1);
    histogram!("sensor.ingest.bytes", body.len() as f64);

    let max_payload = state.max_payload_bytes;
    if body.len() > max_payload {
        counter!("sensor.ingest.rejected", 1);
        return Err(AppError::with_status(
            StatusCode::PAYLOAD_TOO_LARGE,
            anyhow::anyhow!("payload {} exceeds limit {}", body.len(), max_payload),
        ));
    }

    match state.pipeline.submit(&body) {
        Ok(record) => {
            log_packet(&record);
            Ok((StatusCode::OK, Json(json!({"accepted": true}))).into_response())
        }
        Err(err) => match err {
            IngestError::InvalidPayload { ref reason } => {
                counter!("sensor.ingest.invalid", 1);
                debug!("Rejected payload ({} bytes): {}", body.len(), reason);
                Ok((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "accepted": false,
                        "error": err.error_type(),
                        "reason": reason,
                    })),
                )
                    .into_response())
            }
            IngestError::PipelineClosed => Err(AppError::with_status(
                StatusCode::SERVICE_UNAVAILABLE,
                err.into(),
            )),
        },
    }
}

/// GET /api/stats - Ingestion counters
pub(crate) async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.pipeline.stats())
}

/// GET /health - Basic health check
pub(crate) async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "healthy"})))
}

/// GET /ready - Ready while the pipeline still accepts records
pub(crate) async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.pipeline.is_accepting() {
        (StatusCode::OK, Json(json!({"status": "ready"})))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "shutting down"})),
        )
    }
}

fn log_packet(record: &Record) {
    let field = |name: &str| {
        record
            .get(name)
            .filter(|v| !v.is_null())
            .map(|v| v.render().into_owned())
            .unwrap_or_else(|| "-".to_string())
    };
    debug!(
        "Received Packet #{} | Temp: {} | IAQ: {}",
        field("sequence"),
        field("temperature"),
        field("iaq")
    );
}
