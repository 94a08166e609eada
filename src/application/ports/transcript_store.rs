//! Transcript storage port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::transcription::{OwnerRef, Transcript};

/// Transcript storage errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Failed to write transcript for {owner}: {message}")]
    WriteFailed { owner: OwnerRef, message: String },

    #[error("Failed to read transcript for {owner}: {message}")]
    ReadFailed { owner: OwnerRef, message: String },
}

/// Port for persisting transcripts keyed by owner
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Store `transcript`, fully replacing any previous one for the same owner.
    async fn replace(&self, transcript: &Transcript) -> Result<(), StoreError>;

    /// Load the current transcript for `owner`, if any.
    async fn load(&self, owner: &OwnerRef) -> Result<Option<Transcript>, StoreError>;
}
