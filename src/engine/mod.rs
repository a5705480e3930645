//! Whisper transcription engine.

pub mod model;
pub mod whisper;

pub use model::WhisperModel;
pub use whisper::{Transcription, WhisperEngine, WhisperError};
