use crate::engine::ChunkParams;
use crate::streaming::StreamingSettings;
use anyhow::{ensure, Result};
use serde::Deserialize;
use std::time::Duration;

/// Environment variable prefix, e.g. `STREAM_ASR__SERVICE__HTTP__PORT=9000`
pub const ENV_PREFIX: &str = "STREAM_ASR";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub streaming: StreamingConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// Largest accepted upload on the file endpoint
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamingConfig {
    pub sample_rate: u32,
    pub min_samples: usize,
    pub chunk_size: Vec<u32>,
    pub encoder_chunk_look_back: u32,
    pub decoder_chunk_look_back: u32,
    #[serde(default)]
    pub inference_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Model name reported by the service info endpoint
    pub model: String,
    pub nats_url: String,
    /// Subject the inference worker answers requests on
    pub subject: String,
}

impl Config {
    /// Load `path` (any extension the `config` crate understands, optional)
    /// on top of built-in defaults, then apply `STREAM_ASR__*` overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "stream-asr")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8000)?
            .set_default("service.http.max_upload_bytes", 50 * 1024 * 1024)?
            .set_default("streaming.sample_rate", 16000)?
            .set_default("streaming.min_samples", 100)?
            .set_default("streaming.chunk_size", vec![0, 10, 5])?
            .set_default("streaming.encoder_chunk_look_back", 4)?
            .set_default("streaming.decoder_chunk_look_back", 1)?
            .set_default("engine.model", "paraformer-zh-streaming")?
            .set_default("engine.nats_url", "nats://localhost:4222")?
            .set_default("engine.subject", "asr.generate")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.streaming.chunk_params()?;

        Ok(cfg)
    }
}

impl StreamingConfig {
    pub fn chunk_params(&self) -> Result<ChunkParams> {
        ensure!(
            self.chunk_size.len() == 3,
            "streaming.chunk_size must have 3 entries, got {}",
            self.chunk_size.len()
        );
        ensure!(
            self.chunk_size[1] > 0,
            "streaming.chunk_size[1] (window size) must be non-zero"
        );

        Ok(ChunkParams {
            chunk_size: [self.chunk_size[0], self.chunk_size[1], self.chunk_size[2]],
            encoder_chunk_look_back: self.encoder_chunk_look_back,
            decoder_chunk_look_back: self.decoder_chunk_look_back,
        })
    }

    pub fn settings(&self) -> Result<StreamingSettings> {
        Ok(StreamingSettings {
            params: self.chunk_params()?,
            min_samples: self.min_samples,
            inference_timeout: self.inference_timeout_ms.map(Duration::from_millis),
        })
    }
}
