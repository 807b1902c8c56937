pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod recognizer;
pub mod session;
pub mod streaming;

pub use audio::{AudioDecoder, AudioFile, ChunkAssembler, ContainerDecoder};
pub use config::Config;
pub use engine::{ChunkParams, DecoderCache, Generation, InferenceEngine, NatsEngine};
pub use error::{AsrError, EngineError};
pub use http::{create_router, AppState, ServiceInfo};
pub use recognizer::{FileRecognizer, Recognition};
pub use session::{Session, SessionRegistry, Stats, Transcript, TranscriptUpdate};
pub use streaming::{ClientMessage, ServerEvent, StreamingController, StreamingSettings};
