//! Audio transcoding via an ffmpeg subprocess.
//!
//! Uploaded clips arrive in whatever container the browser produced
//! (typically WebM/Opus). ffmpeg converts them to the mono 16 kHz WAV that
//! Whisper expects, through a pair of per-request temp files. Both files are
//! removed afterwards; cleanup failures are logged and otherwise ignored.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Transcoder binary, resolved via PATH.
pub const FFMPEG_BIN: &str = "ffmpeg";

/// Hard limit on a single transcode run. A hung ffmpeg must not stall the
/// request forever.
pub const TRANSCODE_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of ffmpeg's stderr to keep in error messages.
const STDERR_TAIL_BYTES: usize = 512;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("ffmpeg not found on PATH (install ffmpeg or add it to PATH)")]
    BinaryMissing,

    #[error("I/O error during transcoding: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("ffmpeg timed out after {0}s")]
    Timeout(u64),

    #[error("ffmpeg produced no output")]
    EmptyOutput,
}

/// Verify that ffmpeg is invocable. Run once at startup so a missing binary
/// is a boot failure instead of a silent per-request one.
pub async fn probe() -> Result<(), TranscodeError> {
    let result = Command::new(FFMPEG_BIN)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await;

    match result {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(TranscodeError::Failed {
            status: status.to_string(),
            stderr: String::new(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TranscodeError::BinaryMissing)
        }
        Err(e) => Err(e.into()),
    }
}

/// Transcode arbitrary container bytes to mono 16 kHz WAV.
///
/// Equivalent to `ffmpeg -y -i <in> -ac 1 -ar 16000 <out.wav>` with unique
/// temp paths per request.
pub async fn to_wav_16k(input: &[u8]) -> Result<Vec<u8>, TranscodeError> {
    transcode(FFMPEG_BIN, input, TRANSCODE_TIMEOUT).await
}

async fn transcode(bin: &str, input: &[u8], limit: Duration) -> Result<Vec<u8>, TranscodeError> {
    let mut infile = tempfile::Builder::new()
        .prefix("sttd-")
        .suffix(".webm")
        .tempfile()?;
    infile.write_all(input)?;
    infile.flush()?;

    // Same random stem as the input, so uniqueness carries over.
    let out_path = infile.path().with_extension("wav");

    // kill_on_drop so a timed-out ffmpeg is reaped instead of orphaned,
    // still scribbling into out_path after cleanup.
    let run = Command::new(bin)
        .arg("-y")
        .arg("-i")
        .arg(infile.path())
        .args(["-ac", "1", "-ar", "16000"])
        .arg(&out_path)
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(limit, run).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            cleanup(&out_path);
            close_input(infile);
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscodeError::BinaryMissing);
            }
            return Err(e.into());
        }
        Err(_) => {
            cleanup(&out_path);
            close_input(infile);
            return Err(TranscodeError::Timeout(limit.as_secs()));
        }
    };

    if !output.status.success() {
        let stderr = stderr_tail(&output.stderr);
        cleanup(&out_path);
        close_input(infile);
        return Err(TranscodeError::Failed {
            status: output.status.to_string(),
            stderr,
        });
    }

    let wav = std::fs::read(&out_path).map_err(|e| {
        // Nonexistent output despite exit 0 is indistinguishable from empty.
        if e.kind() == std::io::ErrorKind::NotFound {
            TranscodeError::EmptyOutput
        } else {
            TranscodeError::Io(e)
        }
    });

    cleanup(&out_path);
    close_input(infile);

    let wav = wav?;
    if wav.is_empty() {
        return Err(TranscodeError::EmptyOutput);
    }

    debug!("Transcoded {} bytes to {} bytes of WAV", input.len(), wav.len());
    Ok(wav)
}

/// Best-effort removal of the ffmpeg output file.
fn cleanup(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove temp file {}: {}", path.display(), e);
        }
    }
}

/// Best-effort removal of the input temp file.
fn close_input(file: tempfile::NamedTempFile) {
    if let Err(e) = file.close() {
        warn!("Failed to remove input temp file: {}", e);
    }
}

/// Last lines of stderr, for error messages.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL_BYTES {
        return text.to_string();
    }
    let start = text.len() - STDERR_TAIL_BYTES;
    // Keep it valid UTF-8 by snapping to a char boundary.
    let start = (start..text.len())
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(start);
    format!("...{}", &text[start..])
}
