//! Completion event port

use async_trait::async_trait;

use crate::domain::transcription::Transcript;

/// Receives every transcript a job completes, after it has been persisted.
///
/// Downstream consumers (search indexing, notifications) subscribe here
/// instead of the orchestrator depending on them.
#[async_trait]
pub trait TranscriptListener: Send + Sync {
    async fn on_transcript(&self, transcript: &Transcript) -> Result<(), String>;
}
