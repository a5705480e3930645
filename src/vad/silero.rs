//! Silence filtering with silero-vad-rust.
//!
//! Silero VAD is a lightweight LSTM-based voice activity detector operating
//! on 512-sample chunks at 16 kHz (32 ms). The filter scores every chunk,
//! then removes silent runs longer than the configured window.
//!
//! The model keeps LSTM hidden state between chunks, so a filter instance is
//! stateful: `filter` resets the state at the start of each clip, and callers
//! must serialize access (the engine holds the filter behind a mutex).

use super::{silence_chunks, suppress_silence, VadError};
use silero_vad_rust::silero_vad::model::{load_silero_vad, OnnxModel};

/// Silero VAD chunk size in samples (512 samples = 32ms at 16kHz)
pub const CHUNK_SIZE: usize = 512;

/// Silero VAD sample rate
pub const VAD_SAMPLE_RATE: u32 = 16000;

/// Clip-level silence filter backed by Silero VAD.
pub struct SileroFilter {
    model: OnnxModel,
    threshold: f32,
    min_silence_chunks: usize,
}

impl SileroFilter {
    /// Load the bundled Silero model.
    pub fn new(threshold: f32, min_silence_ms: u32) -> Result<Self, VadError> {
        let model = load_silero_vad().map_err(|e| VadError::ModelLoad(format!("{:?}", e)))?;

        Ok(Self {
            model,
            threshold,
            min_silence_chunks: silence_chunks(min_silence_ms, CHUNK_SIZE, VAD_SAMPLE_RATE),
        })
    }

    /// Remove long silent stretches from a clip.
    ///
    /// Returns the surviving samples in order. An all-silent clip yields an
    /// empty vector.
    pub fn filter(&mut self, samples: &[f32]) -> Result<Vec<f32>, VadError> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        self.model.reset_states();

        let mut speech = Vec::with_capacity(samples.len() / CHUNK_SIZE + 1);
        for chunk in samples.chunks(CHUNK_SIZE) {
            let probability = if chunk.len() == CHUNK_SIZE {
                self.score_chunk(chunk)?
            } else {
                // Pad the final partial chunk
                let mut padded = vec![0.0f32; CHUNK_SIZE];
                padded[..chunk.len()].copy_from_slice(chunk);
                self.score_chunk(&padded)?
            };
            speech.push(probability >= self.threshold);
        }

        let keep = suppress_silence(&speech, self.min_silence_chunks);

        let mut filtered = Vec::with_capacity(samples.len());
        for (i, chunk) in samples.chunks(CHUNK_SIZE).enumerate() {
            if keep[i] {
                filtered.extend_from_slice(chunk);
            }
        }

        Ok(filtered)
    }

    fn score_chunk(&mut self, chunk: &[f32]) -> Result<f32, VadError> {
        let probs = self
            .model
            .forward_chunk(chunk, VAD_SAMPLE_RATE)
            .map_err(|e| VadError::Inference(format!("{:?}", e)))?;

        Ok(probs.iter().next().copied().unwrap_or(0.0))
    }
}
