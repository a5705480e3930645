//! Decoding and validation of the transcoded waveform.
//!
//! ffmpeg is instructed to emit mono 16 kHz WAV; this module turns those
//! bytes into f32 samples and checks them before they cross the whisper.cpp
//! FFI boundary.

use std::io::Cursor;
use thiserror::Error;

/// Sample rate Whisper expects (16 kHz)
pub const SAMPLE_RATE: u32 = 16000;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to decode WAV: {0}")]
    Decode(#[from] hound::Error),

    #[error("Unexpected audio format: {channels} channel(s) at {sample_rate}Hz (expected mono {SAMPLE_RATE}Hz)")]
    UnexpectedFormat { channels: u16, sample_rate: u32 },

    #[error("Audio is empty (no samples)")]
    Empty,

    #[error("Audio contains {0} non-finite sample(s)")]
    NonFinite(usize),
}

/// In-memory waveform: f32 samples, mono, 16 kHz.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Audio samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Decode a WAV byte stream produced by the transcoder.
    ///
    /// Accepts 16-bit integer or 32-bit float PCM; anything that is not
    /// mono 16 kHz is rejected rather than resampled, since ffmpeg already
    /// forced the target format.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, AudioError> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        if spec.channels != 1 || spec.sample_rate != SAMPLE_RATE {
            return Err(AudioError::UnexpectedFormat {
                channels: spec.channels,
                sample_rate: spec.sample_rate,
            });
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.samples::<f32>().collect::<Result<_, _>>()?
            }
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let buffer = Self {
            samples,
            sample_rate: spec.sample_rate,
        };
        buffer.validate()?;
        Ok(buffer)
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    fn validate(&self) -> Result<(), AudioError> {
        if self.samples.is_empty() {
            return Err(AudioError::Empty);
        }

        let non_finite = self.samples.iter().filter(|s| !s.is_finite()).count();
        if non_finite > 0 {
            return Err(AudioError::NonFinite(non_finite));
        }

        Ok(())
    }
}
