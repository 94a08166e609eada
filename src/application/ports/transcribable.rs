//! Transcribable entity port interfaces

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioResource;
use crate::domain::transcription::{OwnerRef, Transcript};
use crate::domain::units::ByteSize;

use super::StoreError;

/// No resolver is registered for the requested kind
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown transcribable kind \"{kind}\". Registered kinds: {registered}")]
pub struct UnknownKindError {
    pub kind: String,
    pub registered: String,
}

/// Registry and resolution errors
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error(transparent)]
    UnknownKind(#[from] UnknownKindError),

    #[error("{0} not found")]
    NotFound(OwnerRef),

    #[error("Audio for {owner} is unreadable: {message}")]
    Unreadable { owner: OwnerRef, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An entity that can supply audio and accept its transcript
#[async_trait]
pub trait Transcribable: Send + Sync {
    fn owner(&self) -> &OwnerRef;

    /// Payload cap for backend calls made on behalf of this entity.
    fn max_payload(&self) -> ByteSize;

    /// Open the entity's audio.
    async fn audio(&self) -> Result<AudioResource, RegistryError>;

    /// Persist the finished transcript, replacing any previous one.
    async fn write_back(&self, transcript: &Transcript) -> Result<(), RegistryError>;
}

/// Resolves ids of one entity kind
#[async_trait]
pub trait TranscribableResolver: Send + Sync {
    async fn resolve(&self, id: u64) -> Result<Box<dyn Transcribable>, RegistryError>;
}
