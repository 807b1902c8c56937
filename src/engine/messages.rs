use serde::{Deserialize, Serialize};

/// Window request sent to the inference worker
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub pcm: String,   // Base64-encoded little-endian f32 samples
    pub cache: String, // Base64-encoded opaque decoder cache
    pub is_final: bool,
    pub chunk_size: [u32; 3],
    pub encoder_chunk_look_back: u32,
    pub decoder_chunk_look_back: u32,
}

/// Reply received from the inference worker
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateReply {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub cache: String,
    #[serde(default)]
    pub error: Option<String>,
}
