// Shared test doubles for the inference engine and audio fixtures

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Mutex;
use stream_asr::engine::{ChunkParams, DecoderCache, Generation, InferenceEngine};
use stream_asr::EngineError;

/// Window size used by the default chunk params (600ms at 16kHz)
pub const STRIDE: usize = 9600;

/// One recorded engine invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub samples: usize,
    pub is_final: bool,
    /// Value decoded from the cache the caller passed in
    pub cache_in: Option<u32>,
}

/// How the scripted engine answers
#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Fragment `c{n}` for the n-th call on a cache chain
    Counting,
    /// Never recognizes anything
    Silent,
    /// Fails on the given call index (0-based), counting otherwise
    FailOn(usize),
    /// Returns the listed fragments in call order, nothing once exhausted
    Fragments(&'static [&'static str]),
}

/// Deterministic engine that threads a call counter through the decoder cache
///
/// Each reply cache holds the number of calls made on that chain, so the
/// fragment text proves which cache the caller handed back.
pub struct ScriptedEngine {
    script: Script,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedEngine {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn counting() -> Self {
        Self::new(Script::Counting)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

fn decode_counter(cache: &DecoderCache) -> Option<u32> {
    let bytes: [u8; 4] = cache.as_bytes().try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

#[async_trait::async_trait]
impl InferenceEngine for ScriptedEngine {
    async fn generate(
        &self,
        window: &[f32],
        cache: DecoderCache,
        is_final: bool,
        _params: &ChunkParams,
    ) -> Result<Generation, EngineError> {
        let cache_in = decode_counter(&cache);
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                samples: window.len(),
                is_final,
                cache_in,
            });
            calls.len() - 1
        };

        let n = cache_in.unwrap_or(0);
        let next = DecoderCache::from_bytes((n + 1).to_le_bytes().to_vec());

        match self.script {
            Script::Silent => Ok(Generation {
                text: None,
                cache: next,
            }),
            Script::Fragments(fragments) => Ok(Generation {
                text: fragments.get(index).map(|f| f.to_string()),
                cache: next,
            }),
            Script::FailOn(failing) if failing == index => {
                Err(EngineError::Rejected("scripted failure".to_string()))
            }
            Script::Counting | Script::FailOn(_) => Ok(Generation {
                text: Some(format!("c{}", n)),
                cache: next,
            }),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Engine that never answers
pub struct StalledEngine;

#[async_trait::async_trait]
impl InferenceEngine for StalledEngine {
    async fn generate(
        &self,
        _window: &[f32],
        _cache: DecoderCache,
        _is_final: bool,
        _params: &ChunkParams,
    ) -> Result<Generation, EngineError> {
        futures::future::pending().await
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

/// 16-bit PCM WAV bytes holding `samples` frames of a quiet ramp
pub fn wav_bytes(samples: usize, sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..samples * channels as usize {
            writer.write_sample(((i % 100) as i16) * 10).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Little-endian f32 frame of `samples` zeros
pub fn pcm_frame(samples: usize) -> Vec<u8> {
    stream_asr::audio::encode_f32le(&vec![0.0; samples])
}
