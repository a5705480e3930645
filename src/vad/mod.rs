//! Voice Activity Detection (VAD) module.
//!
//! Filters long silent stretches out of a clip before Whisper inference,
//! using the Silero VAD model with ONNX inference via silero-vad-rust.
//! Pauses shorter than [`MIN_SILENCE_MS`] are kept so words at segment
//! boundaries are not glued together.

pub mod silero;

use thiserror::Error;

pub use silero::SileroFilter;

/// Speech probability threshold (0.0 to 1.0)
pub const SPEECH_THRESHOLD: f32 = 0.5;

/// Silent stretches longer than this are removed before inference (ms)
pub const MIN_SILENCE_MS: u32 = 350;

/// VAD-related errors.
#[derive(Error, Debug)]
pub enum VadError {
    #[error("Failed to load VAD model: {0}")]
    ModelLoad(String),

    #[error("Inference error: {0}")]
    Inference(String),
}

/// Convert a minimum silence duration to a chunk count.
pub(crate) fn silence_chunks(min_silence_ms: u32, chunk_size: usize, sample_rate: u32) -> usize {
    let silence_samples = min_silence_ms as u64 * sample_rate as u64 / 1000;
    (silence_samples / chunk_size as u64) as usize
}

/// Turn a per-chunk speech mask into a keep mask.
///
/// Silent runs strictly longer than `min_silence_chunks` are suppressed;
/// shorter pauses are promoted to speech so they survive filtering.
pub(crate) fn suppress_silence(speech: &[bool], min_silence_chunks: usize) -> Vec<bool> {
    let mut keep = vec![true; speech.len()];
    let mut i = 0;

    while i < speech.len() {
        if speech[i] {
            i += 1;
            continue;
        }

        let run_start = i;
        while i < speech.len() && !speech[i] {
            i += 1;
        }

        if i - run_start > min_silence_chunks {
            for k in keep.iter_mut().take(i).skip(run_start) {
                *k = false;
            }
        }
    }

    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_chunks_350ms() {
        // 350ms at 16kHz = 5600 samples = 10 full 512-sample chunks
        assert_eq!(silence_chunks(350, 512, 16000), 10);
    }

    #[test]
    fn test_all_speech_kept() {
        let keep = suppress_silence(&[true; 8], 2);
        assert_eq!(keep, vec![true; 8]);
    }

    #[test]
    fn test_long_silence_dropped() {
        let speech = [true, false, false, false, false, true];
        let keep = suppress_silence(&speech, 2);
        assert_eq!(keep, vec![true, false, false, false, false, true]);
    }

    #[test]
    fn test_short_pause_kept() {
        let speech = [true, false, false, true];
        let keep = suppress_silence(&speech, 2);
        assert_eq!(keep, vec![true; 4]);
    }

    #[test]
    fn test_leading_and_trailing_silence_dropped() {
        let speech = [false, false, false, true, false, false, false];
        let keep = suppress_silence(&speech, 2);
        assert_eq!(keep, vec![false, false, false, true, false, false, false]);
    }

    #[test]
    fn test_all_silence_dropped() {
        let keep = suppress_silence(&[false; 20], 10);
        assert_eq!(keep, vec![false; 20]);
    }

    #[test]
    fn test_run_exactly_at_limit_kept() {
        let speech = [true, false, false, true];
        let keep = suppress_silence(&speech, 2);
        // Run of 2 is not strictly longer than 2
        assert_eq!(keep, vec![true; 4]);
    }

    #[test]
    fn test_empty_mask() {
        let keep = suppress_silence(&[], 5);
        assert!(keep.is_empty());
    }
}
