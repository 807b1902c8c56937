pub mod chunk;
pub mod file;
pub mod pcm;

pub use chunk::{plan_file_windows, ChunkAssembler};
pub use file::{AudioDecoder, AudioFile, ContainerDecoder};
pub use pcm::{decode_f32le, encode_f32le};
