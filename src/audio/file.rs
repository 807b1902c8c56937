use crate::error::{AsrError, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

/// Decoded mono audio, ready for windowing
#[derive(Debug, Clone)]
pub struct AudioFile {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz as stored in the container
    pub sample_rate: u32,
    /// Channel count before down-mixing
    pub channels: u16,
}

impl AudioFile {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Turns an uploaded byte payload into samples and a sample rate
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<AudioFile>;
}

/// Decoder used by the file endpoint
///
/// WAV payloads go through `hound`; everything else is probed by `symphonia`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerDecoder;

impl AudioDecoder for ContainerDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<AudioFile> {
        let audio = if is_wav(bytes) {
            decode_wav(bytes)?
        } else {
            decode_container(bytes)?
        };

        info!(
            "Audio payload decoded: {:.1}s, {}Hz, {} channels, {} samples",
            audio.duration_seconds(),
            audio.sample_rate,
            audio.channels,
            audio.samples.len()
        );

        Ok(audio)
    }
}

fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

fn decode_wav(bytes: &[u8]) -> Result<AudioFile> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| AsrError::UnsupportedAudioFormat(format!("failed to parse WAV: {}", e)))?;

    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let bits = u32::from(spec.bits_per_sample.max(1));
            let scale = if bits > 1 {
                ((1i64 << (bits - 1)) - 1) as f32
            } else {
                1.0
            };
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<std::result::Result<_, _>>()
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>(),
    }
    .map_err(|e| AsrError::UnsupportedAudioFormat(format!("failed to read WAV samples: {}", e)))?;

    Ok(AudioFile {
        samples: downmix(samples, spec.channels),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn decode_container(bytes: &[u8]) -> Result<AudioFile> {
    let unsupported = |e: SymphoniaError| AsrError::UnsupportedAudioFormat(e.to_string());

    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(unsupported)?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AsrError::UnsupportedAudioFormat("no decodable audio track".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AsrError::UnsupportedAudioFormat("unknown sample rate".to_string()))?;
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(unsupported)?;

    let mut interleaved = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(unsupported(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count() as u16;
                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buffer.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping undecodable packet: {}", e);
            }
            Err(e) => return Err(unsupported(e)),
        }
    }

    debug!(
        "Container decoded: {} interleaved samples, {} channels",
        interleaved.len(),
        channels
    );

    Ok(AudioFile {
        samples: downmix(interleaved, channels),
        sample_rate,
        channels,
    })
}

/// Average interleaved channels down to mono
fn downmix(samples: Vec<f32>, channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples;
    }

    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}
