use super::messages::{GenerateReply, GenerateRequest};
use super::{ChunkParams, DecoderCache, Generation, InferenceEngine};
use crate::audio::encode_f32le;
use crate::error::EngineError;
use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use tracing::{debug, info};

/// Inference engine backed by a model worker listening on NATS request/reply
pub struct NatsEngine {
    client: Client,
    subject: String,
}

impl NatsEngine {
    /// Connect to NATS server
    pub async fn connect(url: &str, subject: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully, requests go to {}", subject);

        Ok(Self { client, subject })
    }

    fn encode_request(
        window: &[f32],
        cache: &DecoderCache,
        is_final: bool,
        params: &ChunkParams,
    ) -> GenerateRequest {
        let b64 = base64::engine::general_purpose::STANDARD;

        GenerateRequest {
            pcm: b64.encode(encode_f32le(window)),
            cache: b64.encode(cache.as_bytes()),
            is_final,
            chunk_size: params.chunk_size,
            encoder_chunk_look_back: params.encoder_chunk_look_back,
            decoder_chunk_look_back: params.decoder_chunk_look_back,
        }
    }

    fn decode_reply(payload: &[u8]) -> Result<Generation, EngineError> {
        let reply: GenerateReply = serde_json::from_slice(payload)
            .map_err(|e| EngineError::Protocol(format!("invalid reply: {}", e)))?;

        if let Some(error) = reply.error {
            return Err(EngineError::Rejected(error));
        }

        let cache = base64::engine::general_purpose::STANDARD
            .decode(reply.cache.as_bytes())
            .map_err(|e| EngineError::Protocol(format!("invalid cache encoding: {}", e)))?;

        Ok(Generation {
            text: reply.text,
            cache: DecoderCache::from_bytes(cache),
        })
    }
}

#[async_trait::async_trait]
impl InferenceEngine for NatsEngine {
    async fn generate(
        &self,
        window: &[f32],
        cache: DecoderCache,
        is_final: bool,
        params: &ChunkParams,
    ) -> Result<Generation, EngineError> {
        let request = Self::encode_request(window, &cache, is_final, params);
        let payload =
            serde_json::to_vec(&request).map_err(|e| EngineError::Protocol(e.to_string()))?;

        let reply = self
            .client
            .request(self.subject.clone(), payload.into())
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        debug!(
            "Inference reply on {} (samples={}, final={}, bytes={})",
            self.subject,
            window.len(),
            is_final,
            reply.payload.len()
        );

        Self::decode_reply(&reply.payload)
    }

    fn is_ready(&self) -> bool {
        matches!(
            self.client.connection_state(),
            async_nats::connection::State::Connected
        )
    }

    fn name(&self) -> &str {
        "nats"
    }
}
