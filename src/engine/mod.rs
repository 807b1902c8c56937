//! Inference engine seam
//!
//! The acoustic model lives behind `InferenceEngine`. The streaming core only
//! hands it fixed-size windows plus the decoder cache returned by the previous
//! call, and reads back at most one text fragment.

mod messages;
mod nats;

pub use messages::{GenerateReply, GenerateRequest};
pub use nats::NatsEngine;

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Samples per `chunk_size` unit (60 ms at 16kHz)
pub const SAMPLES_PER_CHUNK_UNIT: usize = 960;

/// Opaque decoder state threaded through consecutive engine calls
///
/// Only engines look inside. The core moves it from one call to the next and
/// never reuses a cache that has already been handed out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderCache {
    state: Vec<u8>,
}

impl DecoderCache {
    pub fn from_bytes(state: Vec<u8>) -> Self {
        Self { state }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.state
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.state
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

/// Streaming window configuration passed to the model on every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkParams {
    /// `[left context, window, lookahead]` in 60 ms units
    pub chunk_size: [u32; 3],
    pub encoder_chunk_look_back: u32,
    pub decoder_chunk_look_back: u32,
}

impl ChunkParams {
    /// Window size in samples (`chunk_size[1]` units of 960 samples)
    pub fn chunk_stride(&self) -> usize {
        self.chunk_size[1] as usize * SAMPLES_PER_CHUNK_UNIT
    }
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            chunk_size: [0, 10, 5], // 600ms windows
            encoder_chunk_look_back: 4,
            decoder_chunk_look_back: 1,
        }
    }
}

/// Result of one engine call
#[derive(Debug, Clone, Default)]
pub struct Generation {
    /// Recognized fragment, if the model produced one for this window
    pub text: Option<String>,
    /// Cache to use for the next call on the same stream
    pub cache: DecoderCache,
}

/// Streaming speech recognition model
#[async_trait::async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Run the model over one window
    ///
    /// `is_final` asks the model to flush everything it is still holding.
    async fn generate(
        &self,
        window: &[f32],
        cache: DecoderCache,
        is_final: bool,
        params: &ChunkParams,
    ) -> Result<Generation, EngineError>;

    /// Whether the engine can currently serve requests
    fn is_ready(&self) -> bool {
        true
    }

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Call `engine.generate`, failing with `EngineError::Timeout` if `timeout` elapses first
pub async fn generate_with_timeout(
    engine: &dyn InferenceEngine,
    window: &[f32],
    cache: DecoderCache,
    is_final: bool,
    params: &ChunkParams,
    timeout: Option<Duration>,
) -> Result<Generation, EngineError> {
    let call = engine.generate(window, cache, is_final, params);

    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| EngineError::Timeout(limit))?,
        None => call.await,
    }
}
