//! One-shot recognition of a complete audio payload

use crate::audio::{plan_file_windows, AudioDecoder};
use crate::engine::{generate_with_timeout, DecoderCache, InferenceEngine};
use crate::error::{AsrError, Result};
use crate::session::SessionRegistry;
use crate::streaming::StreamingSettings;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Transcript of an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recognition {
    pub text: String,
    /// Audio length in seconds
    pub duration: f64,
}

/// Runs the streaming window/inference/accumulate loop over a whole buffer
///
/// Uses its own decoder cache, independent of any live session.
pub struct FileRecognizer {
    engine: Arc<dyn InferenceEngine>,
    decoder: Arc<dyn AudioDecoder>,
    registry: SessionRegistry,
    settings: StreamingSettings,
    sample_rate: u32,
}

impl FileRecognizer {
    pub fn new(
        engine: Arc<dyn InferenceEngine>,
        decoder: Arc<dyn AudioDecoder>,
        registry: SessionRegistry,
        settings: StreamingSettings,
        sample_rate: u32,
    ) -> Self {
        Self {
            engine,
            decoder,
            registry,
            settings,
            sample_rate,
        }
    }

    /// Decode `audio_bytes` and recognize it
    pub async fn recognize(&self, audio_bytes: &[u8]) -> Result<Recognition> {
        let audio = self.decoder.decode(audio_bytes)?;

        if audio.sample_rate != self.sample_rate {
            return Err(AsrError::UnsupportedAudioFormat(format!(
                "sample rate must be {}Hz, got {}Hz",
                self.sample_rate, audio.sample_rate
            )));
        }

        let text = self.recognize_samples(&audio.samples).await?;
        let duration = audio.duration_seconds();

        self.registry.record_request();

        info!(
            "File recognized: {:.1}s, {} chars",
            duration,
            text.chars().count()
        );

        Ok(Recognition { text, duration })
    }

    /// Window `samples` and run every window through a fresh cache
    ///
    /// The last window (possibly empty) is always sent with `is_final = true`.
    pub async fn recognize_samples(&self, samples: &[f32]) -> Result<String> {
        let windows = plan_file_windows(samples.len(), self.settings.params.chunk_stride());
        let last = windows.len() - 1;

        let mut cache = DecoderCache::default();
        let mut text = String::new();

        for (index, range) in windows.into_iter().enumerate() {
            let is_final = index == last;
            let generation = generate_with_timeout(
                self.engine.as_ref(),
                &samples[range],
                cache,
                is_final,
                &self.settings.params,
                self.settings.inference_timeout,
            )
            .await?;

            cache = generation.cache;

            // Every fragment is kept verbatim, whitespace included
            if let Some(fragment) = generation.text {
                debug!("File window {}: {:?}", index, fragment);
                text.push_str(&fragment);
            }
        }

        Ok(text)
    }
}
