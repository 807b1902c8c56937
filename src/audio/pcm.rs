use crate::error::{AsrError, Result};

const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();

/// Decode a binary websocket frame of little-endian f32 PCM samples
pub fn decode_f32le(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % SAMPLE_BYTES != 0 {
        return Err(AsrError::MalformedAudioFrame(bytes.len()));
    }

    Ok(bytes
        .chunks_exact(SAMPLE_BYTES)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Encode samples as little-endian f32 bytes
pub fn encode_f32le(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
