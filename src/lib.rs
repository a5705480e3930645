//! sttd library exports for integration tests and fuzzing.

pub mod api;
pub mod audio;
pub mod config;
pub mod engine;
pub mod transcode;
pub mod vad;

// Re-export commonly used types for convenience
pub use audio::AudioBuffer;
pub use config::Config;
pub use engine::{Transcription, WhisperEngine, WhisperModel};
