use super::state::AppState;
use crate::error::AsrError;
use crate::session::Stats;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ServiceInfoResponse {
    pub service: String,
    pub model: String,
    pub status: String,
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub stats: Stats,
    pub service: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct RecognizeFileResponse {
    pub success: bool,
    pub text: String,
    pub duration: f64,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: message,
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
/// Service information
pub async fn service_info(State(state): State<AppState>) -> impl IntoResponse {
    let endpoints = BTreeMap::from([
        ("websocket", "/ws/asr"),
        ("health", "/health"),
        ("upload", "/api/asr/file"),
    ]);

    Json(ServiceInfoResponse {
        service: state.info.name.clone(),
        model: state.info.model.clone(),
        status: "running".to_string(),
        endpoints,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /health
/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.engine.is_ready() {
        "healthy"
    } else {
        "not ready"
    };

    Json(HealthResponse {
        status: status.to_string(),
        stats: state.registry.stats(),
        service: "asr".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// POST /api/asr/file
/// Recognize an uploaded audio file (multipart field `file`)
pub async fn recognize_file(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Invalid multipart payload: {}", e);
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid multipart payload: {}", e),
                );
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        match field.bytes().await {
            Ok(bytes) => upload = Some((filename, bytes)),
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed reading multipart 'file' field: {}", e),
                )
            }
        }
        break;
    }

    let Some((filename, bytes)) = upload else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing multipart 'file' field".to_string(),
        );
    };

    info!(
        "Received file upload: {} ({} bytes)",
        filename.as_deref().unwrap_or("<unnamed>"),
        bytes.len()
    );

    match state.recognizer.recognize(&bytes).await {
        Ok(recognition) => {
            info!(
                "File recognized: {}",
                recognition.text.chars().take(100).collect::<String>()
            );
            (
                StatusCode::OK,
                Json(RecognizeFileResponse {
                    success: true,
                    text: recognition.text,
                    duration: recognition.duration,
                    filename,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("File recognition failed: {}", e);
            let status = match e {
                AsrError::UnsupportedAudioFormat(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(status, e.to_string())
        }
    }
}
