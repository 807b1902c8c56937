use crate::engine::InferenceEngine;
use crate::recognizer::FileRecognizer;
use crate::session::SessionRegistry;
use crate::streaming::StreamingSettings;
use std::sync::Arc;

/// Shared application state for HTTP and websocket handlers
#[derive(Clone)]
pub struct AppState {
    /// Live streaming sessions and service counters
    pub registry: SessionRegistry,

    /// Model used by streaming connections and the file endpoint
    pub engine: Arc<dyn InferenceEngine>,

    /// One-shot recognizer for uploaded files
    pub recognizer: Arc<FileRecognizer>,

    /// Window configuration handed to each connection's controller
    pub settings: StreamingSettings,

    /// Service identity for the info endpoint
    pub info: ServiceInfo,
}

/// Static description of the running service
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub name: String,
    pub model: String,
    pub max_upload_bytes: usize,
}
