//! Transcription backend port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioData;
use crate::domain::units::Duration;

/// Transcription backend errors
#[derive(Debug, Clone, Error)]
pub enum TranscriptionError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Backend call timed out after {0}")]
    Timeout(Duration),

    #[error("Backend unavailable: {0}")]
    ServerError(String),

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Payload of {0} bytes rejected as too large")]
    PayloadTooLarge(usize),

    #[error("Audio rejected by backend: {0}")]
    UnsupportedAudio(String),

    #[error("Could not read segment audio: {0}")]
    AudioUnreadable(String),

    #[error("Empty transcription response")]
    EmptyResponse,

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("API error: {0}")]
    ApiError(String),
}

impl TranscriptionError {
    /// Transient errors are worth retrying; everything else fails the segment.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Timeout(_) | Self::ServerError(_) | Self::RequestFailed(_)
        )
    }
}

/// Port for the external speech-to-text backend
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one payload of audio to text.
    async fn transcribe(&self, audio: &AudioData) -> Result<String, TranscriptionError>;
}
