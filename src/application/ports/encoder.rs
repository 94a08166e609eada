//! Encoder and slicer port interfaces

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioResource;
use crate::domain::transcription::TimeRange;
use crate::domain::units::Duration;

/// Encoding, probing and extraction errors
#[derive(Debug, Clone, Error)]
pub enum EncodingError {
    #[error("{0} not found. Install it or set encoder.ffmpeg / encoder.ffprobe")]
    ToolNotFound(String),

    #[error("Failed to start {tool}: {message}")]
    SpawnFailed { tool: String, message: String },

    #[error("{tool} exited with {status}: {stderr}")]
    ProcessFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Encoder produced an empty output file")]
    EmptyOutput,

    #[error("Encoder timed out after {0}")]
    TimedOut(Duration),

    #[error("Could not determine audio duration: {0}")]
    Probe(String),

    #[error("Audio I/O failed: {0}")]
    Io(String),
}

/// Port for normalising source audio into the pipeline's target codec
#[async_trait]
pub trait AudioEncoder: Send + Sync {
    /// Whether `source` has to be re-encoded before segmentation.
    fn needs_encoding(&self, source: &AudioResource) -> bool;

    /// Re-encode `source`. The returned resource owns a temporary file.
    async fn encode(&self, source: &AudioResource) -> Result<AudioResource, EncodingError>;
}

/// Port for measuring audio and cutting time slices out of it
#[async_trait]
pub trait AudioSlicer: Send + Sync {
    /// Total duration of `audio` in milliseconds.
    async fn probe_duration_ms(&self, audio: &AudioResource) -> Result<u64, EncodingError>;

    /// Extract `range` of `source` into its own temporary resource.
    async fn extract(
        &self,
        source: &AudioResource,
        range: TimeRange,
    ) -> Result<AudioResource, EncodingError>;
}
