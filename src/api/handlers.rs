//! API request handlers.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::state::ApiState;
use crate::audio::{AudioBuffer, AudioError};
use crate::engine::WhisperError;
use crate::transcode::{self, TranscodeError};

/// Multipart field carrying the uploaded clip.
pub const AUDIO_FIELD: &str = "audio";

/// Transcription response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SttResponse {
    /// Transcribed text
    pub text: String,
    /// Language used for decoding
    pub language: String,
    /// Clip duration in seconds
    pub duration: f64,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "ok" if server is responding
    pub status: String,
    /// Service version
    pub version: String,
    /// Loaded model tier
    pub model: String,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always false for errors
    pub ok: bool,
    /// Error message
    pub error: String,
}

/// Failures a request can surface, classified into HTTP statuses.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing multipart field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid upload: {0}")]
    BadUpload(String),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Whisper(#[from] WhisperError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this failure.
    ///
    /// Bad requests are the client's fault (400), audio the transcoder or
    /// decoder rejects is unprocessable (422), a hung transcoder maps to a
    /// gateway timeout (504), everything else is a plain 500.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) | ApiError::BadUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::Transcode(TranscodeError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Transcode(TranscodeError::Failed { .. })
            | ApiError::Transcode(TranscodeError::EmptyOutput)
            | ApiError::Audio(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Transcode(_) | ApiError::Whisper(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        } else {
            debug!("Request rejected: {}", self);
        }
        let body = Json(ErrorResponse {
            ok: false,
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.model.clone(),
    })
}

/// Transcribe an uploaded audio clip.
///
/// Accepts any container ffmpeg can decode under the `audio` multipart
/// field, converts it to mono 16 kHz and runs Whisper inference.
#[utoipa::path(
    post,
    path = "/stt",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Transcription result", body = SttResponse),
        (status = 400, description = "Missing or unreadable upload", body = ErrorResponse),
        (status = 422, description = "Audio could not be decoded", body = ErrorResponse),
        (status = 504, description = "Transcoder timed out", body = ErrorResponse),
        (status = 500, description = "Inference failed", body = ErrorResponse)
    ),
    tag = "Transcription"
)]
pub async fn stt(
    State(state): State<ApiState>,
    multipart: Multipart,
) -> Result<Json<SttResponse>, ApiError> {
    let raw = read_audio_field(multipart).await?;
    debug!("Received {} byte upload", raw.len());

    let wav = transcode::to_wav_16k(&raw).await?;

    // whisper.cpp decoding is CPU-bound; keep it off the async executor.
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let audio = AudioBuffer::from_wav_bytes(&wav)?;
        engine.transcribe(&audio).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("transcription task panicked: {e}")))??;

    Ok(Json(SttResponse {
        text: result.text,
        language: result.language,
        duration: result.duration,
    }))
}

/// Pull the audio bytes out of the multipart body.
async fn read_audio_field(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadUpload(e.to_string()))?
    {
        if field.name() == Some(AUDIO_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadUpload(e.to_string()))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(ApiError::MissingField(AUDIO_FIELD))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::MissingField("audio").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::BadUpload("truncated".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Transcode(TranscodeError::Timeout(30)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::Transcode(TranscodeError::Failed {
                status: "exit status: 1".into(),
                stderr: "Invalid data".into(),
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Transcode(TranscodeError::EmptyOutput).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Audio(AudioError::Empty).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Transcode(TranscodeError::BinaryMissing).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_shape() {
        let err = ApiError::MissingField(AUDIO_FIELD);
        let body = serde_json::to_value(ErrorResponse {
            ok: false,
            error: err.to_string(),
        })
        .unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "Missing multipart field 'audio'");
    }
}
