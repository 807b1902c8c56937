use super::transcript::Transcript;
use crate::audio::ChunkAssembler;
use crate::engine::DecoderCache;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// State of one recognition stream
///
/// Owned by the registry and touched only by the connection that created it.
#[derive(Debug)]
pub struct Session {
    /// Registry key, fixed for the session's lifetime
    id: Uuid,

    /// When the session was created
    created_at: DateTime<Utc>,

    /// Decoder state returned by the most recent engine call
    pub cache: DecoderCache,

    /// Fragments recognized so far
    pub transcript: Transcript,

    /// Samples not yet forming a complete window
    pub audio: ChunkAssembler,
}

impl Session {
    pub fn new(id: Uuid, chunk_stride: usize) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            cache: DecoderCache::default(),
            transcript: Transcript::new(),
            audio: ChunkAssembler::new(chunk_stride),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of windows that produced a non-empty fragment
    pub fn chunk_count(&self) -> usize {
        self.transcript.chunk_count()
    }
}
