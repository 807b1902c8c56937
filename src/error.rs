//! Error types for the streaming recognition core.

use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Recognition error variants, one per failure class a connection or request can hit.
#[derive(Debug, Error)]
pub enum AsrError {
    /// Operation referenced a session id that is not registered
    #[error("invalid session id: {0}")]
    InvalidSession(Uuid),

    /// Audio arrived while the connection has no session
    #[error("no active session, send a start message first")]
    NoActiveSession,

    /// Control frame could not be parsed as a JSON control object
    #[error("malformed control message: {0}")]
    MalformedControlMessage(String),

    /// Binary frame is not a whole number of little-endian f32 samples
    #[error("malformed audio frame: {0} bytes is not a multiple of 4")]
    MalformedAudioFrame(usize),

    /// Uploaded audio could not be decoded or has the wrong sample rate
    #[error("unsupported audio format: {0}")]
    UnsupportedAudioFormat(String),

    /// The inference engine failed while processing a window
    #[error("inference failed: {0}")]
    InferenceFailure(#[from] EngineError),
}

/// Failures raised by an inference engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No result within the configured per-call timeout
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),

    /// The engine could not be reached
    #[error("engine transport error: {0}")]
    Transport(String),

    /// The engine answered with something we could not decode
    #[error("engine protocol error: {0}")]
    Protocol(String),

    /// The engine processed the request and reported an error
    #[error("engine rejected request: {0}")]
    Rejected(String),
}

/// Result type alias for recognition operations.
pub type Result<T> = std::result::Result<T, AsrError>;
