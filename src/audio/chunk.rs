use std::ops::Range;
use tracing::trace;

/// Buffers incoming samples and slices them into fixed-size inference windows
///
/// Samples are kept in arrival order. Whatever does not fill a whole window
/// stays buffered until the next push (or until `take_remainder` on finalize).
#[derive(Debug, Clone)]
pub struct ChunkAssembler {
    /// Window size in samples
    chunk_stride: usize,
    /// Pending samples, always shorter than `chunk_stride` between pushes
    buffer: Vec<f32>,
}

impl ChunkAssembler {
    /// # Panics
    ///
    /// Panics if `chunk_stride` is zero.
    pub fn new(chunk_stride: usize) -> Self {
        assert!(chunk_stride > 0, "chunk stride must be non-zero");

        Self {
            chunk_stride,
            buffer: Vec::with_capacity(chunk_stride),
        }
    }

    /// Append `samples` and drain every complete window, oldest first
    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.buffer.extend_from_slice(samples);

        let complete = self.buffer.len() / self.chunk_stride;
        if complete == 0 {
            return Vec::new();
        }

        let consumed = complete * self.chunk_stride;
        let drained: Vec<f32> = self.buffer.drain(..consumed).collect();
        let windows: Vec<Vec<f32>> = drained
            .chunks_exact(self.chunk_stride)
            .map(<[f32]>::to_vec)
            .collect();

        trace!(
            "Assembled {} window(s), {} samples still buffered",
            windows.len(),
            self.buffer.len()
        );

        windows
    }

    /// Take the buffered sub-window tail, leaving the assembler empty
    pub fn take_remainder(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.buffer)
    }

    /// Number of samples waiting for the next window
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn chunk_stride(&self) -> usize {
        self.chunk_stride
    }
}

/// Plan the windows used to recognize a complete buffer of `sample_count` samples.
///
/// Always yields `sample_count / chunk_stride + 1` ranges: one per full
/// window plus a trailing range holding the tail, which is empty when the
/// length is an exact multiple of the stride. The trailing range is the one
/// dispatched with `is_final = true` so the model flushes its state.
///
/// # Panics
///
/// Panics if `chunk_stride` is zero.
pub fn plan_file_windows(sample_count: usize, chunk_stride: usize) -> Vec<Range<usize>> {
    assert!(chunk_stride > 0, "chunk stride must be non-zero");

    let total = sample_count / chunk_stride + 1;

    (0..total)
        .map(|i| {
            let start = (i * chunk_stride).min(sample_count);
            let end = ((i + 1) * chunk_stride).min(sample_count);
            start..end
        })
        .collect()
}
