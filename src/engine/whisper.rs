//! Whisper inference using whisper-rs.
//!
//! One engine instance is loaded at startup and shared read-only by every
//! request. Decoding is tuned for latency over accuracy: greedy sampling
//! (beam width 1), fixed language, 4 threads.

use crate::audio::AudioBuffer;
use crate::vad::{SileroFilter, VadError, MIN_SILENCE_MS, SPEECH_THRESHOLD};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Spoken language the service transcribes. Fixed at compile time; there is
/// no auto-detection.
pub const LANGUAGE: &str = "ar";

/// Worker threads for whisper.cpp's internal parallelism
const N_THREADS: i32 = 4;

#[derive(Error, Debug)]
pub enum WhisperError {
    #[error("Model not found at {path}. Run 'sttd model download {1}'", path = .0.display())]
    ModelNotFound(PathBuf, String),

    #[error("Failed to load model: {0}")]
    LoadFailed(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),
}

impl From<VadError> for WhisperError {
    fn from(e: VadError) -> Self {
        WhisperError::TranscriptionFailed(e.to_string())
    }
}

/// Result of transcribing one clip.
#[derive(Debug, Clone, Serialize)]
pub struct Transcription {
    /// Transcribed text (trimmed segments joined with single spaces)
    pub text: String,
    /// Language used for decoding
    pub language: String,
    /// Clip duration in seconds, before silence filtering
    pub duration: f64,
}

/// Whisper transcription engine.
///
/// The whisper.cpp context is read-only after load; per-call decoder state
/// is created inside `transcribe`. The Silero filter is the only mutable
/// member and is serialized behind a mutex.
pub struct WhisperEngine {
    ctx: WhisperContext,
    vad: Mutex<SileroFilter>,
    language: String,
}

impl WhisperEngine {
    /// Load the GGML model and the bundled VAD model.
    pub fn load(model_path: &Path, language: &str) -> Result<Self, WhisperError> {
        info!("Loading Whisper model from: {}", model_path.display());

        if !model_path.exists() {
            let model_name = model_path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix("ggml-"))
                .unwrap_or("unknown");

            return Err(WhisperError::ModelNotFound(
                model_path.to_path_buf(),
                model_name.to_string(),
            ));
        }

        let ctx = WhisperContext::new_with_params(
            model_path.to_str().unwrap_or_default(),
            WhisperContextParameters::default(),
        )
        .map_err(|e| WhisperError::LoadFailed(format!("{:?}", e)))?;

        let vad = SileroFilter::new(SPEECH_THRESHOLD, MIN_SILENCE_MS)
            .map_err(|e| WhisperError::LoadFailed(e.to_string()))?;

        info!("Whisper model loaded successfully");

        Ok(Self {
            ctx,
            vad: Mutex::new(vad),
            language: language.to_string(),
        })
    }

    /// Language the engine decodes.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Transcribe a clip.
    ///
    /// Silence-filters the waveform, then runs greedy decoding. The reported
    /// duration covers the whole clip, not just the surviving speech.
    pub fn transcribe(&self, audio: &AudioBuffer) -> Result<Transcription, WhisperError> {
        let duration = audio.duration_secs();

        debug!(
            "Transcribing {:.2}s of audio ({} samples)",
            duration,
            audio.samples.len()
        );

        let speech = {
            let mut vad = self
                .vad
                .lock()
                .map_err(|_| WhisperError::TranscriptionFailed("VAD mutex poisoned".into()))?;
            vad.filter(&audio.samples)?
        };

        // Nothing but silence: skip inference, whisper.cpp rejects empty input.
        if speech.is_empty() {
            debug!("Clip is entirely silence, skipping inference");
            return Ok(Transcription {
                text: String::new(),
                language: self.language.clone(),
                duration,
            });
        }

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| WhisperError::TranscriptionFailed(format!("{:?}", e)))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(&self.language));
        params.set_n_threads(N_THREADS);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &speech)
            .map_err(|e| WhisperError::TranscriptionFailed(format!("{:?}", e)))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| WhisperError::TranscriptionFailed(format!("{:?}", e)))?;

        let mut segments: Vec<String> = Vec::with_capacity(num_segments as usize);
        for i in 0..num_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| WhisperError::TranscriptionFailed(format!("{:?}", e)))?;
            segments.push(segment);
        }
        let text = join_segments(segments.iter().map(String::as_str));

        info!(
            "Transcription complete ({} segments, {} chars, {:.2}s audio)",
            num_segments,
            text.len(),
            duration
        );

        Ok(Transcription {
            text,
            language: self.language.clone(),
            duration,
        })
    }
}

/// Trim, drop empties, join with single spaces.
fn join_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_segments() {
        let joined = join_segments([" hello", "world ", "  ", "", "again"]);
        assert_eq!(joined, "hello world again");
    }

    #[test]
    fn test_join_segments_all_empty() {
        assert_eq!(join_segments(["  ", "", "\t"]), "");
    }

    #[test]
    fn test_model_not_found_names_tier() {
        let err = WhisperEngine::load(Path::new("/nonexistent/ggml-medium.bin"), LANGUAGE)
            .err()
            .expect("load should fail for a missing model");
        match err {
            WhisperError::ModelNotFound(path, name) => {
                assert_eq!(path, PathBuf::from("/nonexistent/ggml-medium.bin"));
                assert_eq!(name, "medium");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_model_not_found_unrecognized_path() {
        // A path without the ggml- prefix must not guess a tier for the
        // download hint.
        let err = WhisperEngine::load(Path::new("/nonexistent/custom.bin"), LANGUAGE)
            .err()
            .expect("load should fail for a missing model");
        match err {
            WhisperError::ModelNotFound(_, name) => assert_eq!(name, "unknown"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
