//! HTTP API server for streaming and one-shot recognition
//!
//! Routes:
//! - GET /ws/asr - Websocket streaming recognition
//! - POST /api/asr/file - Recognize an uploaded audio file
//! - GET /health - Health check with service statistics
//! - GET / - Service information

mod handlers;
mod routes;
mod state;
mod ws;

pub use routes::create_router;
pub use state::{AppState, ServiceInfo};
pub use ws::run_connection;
