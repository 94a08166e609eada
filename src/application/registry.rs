//! Transcribable registry

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::transcription::{EntityKind, Transcript};

use super::ports::{RegistryError, Transcribable, TranscribableResolver, UnknownKindError};

/// Explicit table from entity kind to resolver, populated at startup.
#[derive(Default, Clone)]
pub struct TranscribableRegistry {
    resolvers: BTreeMap<EntityKind, Arc<dyn TranscribableResolver>>,
}

impl TranscribableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `resolver` for `kind`, replacing any previous registration.
    pub fn register(&mut self, kind: EntityKind, resolver: Arc<dyn TranscribableResolver>) {
        tracing::debug!(kind = %kind, "Registered transcribable kind");
        self.resolvers.insert(kind, resolver);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, kind: EntityKind, resolver: Arc<dyn TranscribableResolver>) -> Self {
        self.register(kind, resolver);
        self
    }

    pub fn kinds(&self) -> impl Iterator<Item = &EntityKind> {
        self.resolvers.keys()
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.resolvers.keys().any(|k| k.as_str() == kind)
    }

    /// Resolve an entity reference. The kind is taken as a raw tag so that
    /// malformed and unregistered kinds both surface as `UnknownKind`.
    pub async fn resolve(
        &self,
        kind: &str,
        id: u64,
    ) -> Result<Box<dyn Transcribable>, RegistryError> {
        let resolver = self
            .resolvers
            .iter()
            .find(|(k, _)| k.as_str() == kind)
            .map(|(_, r)| Arc::clone(r))
            .ok_or_else(|| self.unknown(kind))?;

        resolver.resolve(id).await
    }

    /// Resolve the owner and write `transcript` through its storage.
    pub async fn write_back(
        &self,
        kind: &str,
        id: u64,
        transcript: &Transcript,
    ) -> Result<(), RegistryError> {
        let entity = self.resolve(kind, id).await?;
        entity.write_back(transcript).await
    }

    fn unknown(&self, kind: &str) -> UnknownKindError {
        let registered = self
            .resolvers
            .keys()
            .map(EntityKind::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        UnknownKindError {
            kind: kind.to_string(),
            registered: if registered.is_empty() {
                "(none)".to_string()
            } else {
                registered
            },
        }
    }
}
