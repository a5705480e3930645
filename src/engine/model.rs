//! Whisper model tiers and download management.

use futures_util::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Available Whisper model tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhisperModel {
    Tiny,
    Base,
    Small,
    Medium,
    LargeV3,
}

impl WhisperModel {
    /// All tiers, smallest first.
    pub const ALL: [WhisperModel; 5] = [
        Self::Tiny,
        Self::Base,
        Self::Small,
        Self::Medium,
        Self::LargeV3,
    ];

    /// Parse model tier from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tiny" => Some(Self::Tiny),
            "base" => Some(Self::Base),
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" | "large-v3" | "largev3" => Some(Self::LargeV3),
            _ => None,
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Base => "base",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::LargeV3 => "large-v3",
        }
    }

    /// GGML model filename
    pub fn filename(&self) -> &'static str {
        match self {
            Self::Tiny => "ggml-tiny.bin",
            Self::Base => "ggml-base.bin",
            Self::Small => "ggml-small.bin",
            Self::Medium => "ggml-medium.bin",
            Self::LargeV3 => "ggml-large-v3.bin",
        }
    }

    /// Approximate model size in bytes
    pub fn size_bytes(&self) -> u64 {
        match self {
            Self::Tiny => 75_000_000,
            Self::Base => 142_000_000,
            Self::Small => 466_000_000,
            Self::Medium => 1_500_000_000,
            Self::LargeV3 => 3_000_000_000,
        }
    }

    /// Hugging Face download URL
    pub fn download_url(&self) -> String {
        format!(
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/{}",
            self.filename()
        )
    }

    /// Whether the model file exists under `models_dir`.
    pub fn is_downloaded(&self, models_dir: &Path) -> bool {
        models_dir.join(self.filename()).exists()
    }
}

/// Download a model into `models_dir`, streaming to disk.
pub async fn download_model(model: WhisperModel, models_dir: &Path) -> Result<PathBuf, ModelError> {
    std::fs::create_dir_all(models_dir)?;
    let path = models_dir.join(model.filename());

    if path.exists() {
        info!("Model {} already downloaded", model.name());
        return Ok(path);
    }

    let url = model.download_url();
    info!("Downloading {} from {}", model.name(), url);

    let response = reqwest::get(&url)
        .await
        .map_err(|e| ModelError::DownloadFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ModelError::DownloadFailed(format!(
            "HTTP {}: {}",
            response.status(),
            url
        )));
    }

    let total_size = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut last_percent = 0;

    // Write to a temp name first so an interrupted download never looks
    // like a complete model.
    let partial = path.with_extension("bin.partial");
    let mut file = std::fs::File::create(&partial)?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ModelError::DownloadFailed(e.to_string()))?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;

        if total_size > 0 {
            let percent = (downloaded as f64 / total_size as f64 * 100.0) as u32;
            if percent >= last_percent + 10 {
                debug!("Download progress: {}%", percent);
                last_percent = percent;
            }
        }
    }

    file.flush()?;
    drop(file);
    std::fs::rename(&partial, &path)?;

    info!("Downloaded: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(WhisperModel::from_str("tiny"), Some(WhisperModel::Tiny));
        assert_eq!(WhisperModel::from_str("SMALL"), Some(WhisperModel::Small));
        assert_eq!(
            WhisperModel::from_str("LARGE-V3"),
            Some(WhisperModel::LargeV3)
        );
        assert_eq!(WhisperModel::from_str("invalid"), None);
    }

    #[test]
    fn test_filename() {
        assert_eq!(WhisperModel::Tiny.filename(), "ggml-tiny.bin");
        assert_eq!(WhisperModel::LargeV3.filename(), "ggml-large-v3.bin");
    }

    #[test]
    fn test_name_round_trips() {
        for model in WhisperModel::ALL {
            assert_eq!(WhisperModel::from_str(model.name()), Some(model));
        }
    }

    #[test]
    fn test_not_downloaded_in_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!WhisperModel::Small.is_downloaded(dir.path()));
    }
}
