use super::handlers;
use super::state::AppState;
use super::ws;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.info.max_upload_bytes;

    Router::new()
        // Service info and health
        .route("/", get(handlers::service_info))
        .route("/health", get(handlers::health_check))
        // Streaming recognition
        .route("/ws/asr", get(ws::ws_handler))
        // One-shot file recognition
        .route(
            "/api/asr/file",
            post(handlers::recognize_file).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
