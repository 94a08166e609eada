//! Filesystem-backed transcribable entities

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{
    RegistryError, Transcribable, TranscribableResolver, TranscriptStore,
};
use crate::domain::audio::{AudioFormat, AudioResource};
use crate::domain::transcription::{EntityKind, OwnerRef, Transcript};
use crate::domain::units::ByteSize;

/// Resolves ids of one kind to audio files at `<library>/<kind>/<id>.<ext>`
pub struct LibraryResolver {
    kind: EntityKind,
    dir: PathBuf,
    max_payload: ByteSize,
    store: Arc<dyn TranscriptStore>,
}

impl LibraryResolver {
    pub fn new(
        library_dir: impl AsRef<Path>,
        kind: EntityKind,
        max_payload: ByteSize,
        store: Arc<dyn TranscriptStore>,
    ) -> Self {
        Self {
            dir: library_dir.as_ref().join(kind.as_str()),
            kind,
            max_payload,
            store,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn find_audio(&self, id: u64) -> Option<(PathBuf, AudioFormat)> {
        for format in AudioFormat::ALL {
            let candidate = self.dir.join(format!("{}.{}", id, format.extension()));
            if fs::try_exists(&candidate).await.unwrap_or(false) {
                return Some((candidate, format));
            }
        }
        None
    }
}

#[async_trait]
impl TranscribableResolver for LibraryResolver {
    async fn resolve(&self, id: u64) -> Result<Box<dyn Transcribable>, RegistryError> {
        let owner = OwnerRef::new(self.kind.clone(), id);
        let (path, format) = self
            .find_audio(id)
            .await
            .ok_or_else(|| RegistryError::NotFound(owner.clone()))?;

        tracing::debug!(owner = %owner, path = %path.display(), "Resolved library entity");

        Ok(Box::new(LibraryEntity {
            owner,
            path,
            format,
            max_payload: self.max_payload,
            store: Arc::clone(&self.store),
        }))
    }
}

/// An audio file in the library plus the store its transcript goes to
pub struct LibraryEntity {
    owner: OwnerRef,
    path: PathBuf,
    format: AudioFormat,
    max_payload: ByteSize,
    store: Arc<dyn TranscriptStore>,
}

#[async_trait]
impl Transcribable for LibraryEntity {
    fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    fn max_payload(&self) -> ByteSize {
        self.max_payload
    }

    async fn audio(&self) -> Result<AudioResource, RegistryError> {
        let metadata = fs::metadata(&self.path)
            .await
            .map_err(|e| RegistryError::Unreadable {
                owner: self.owner.clone(),
                message: e.to_string(),
            })?;
        Ok(AudioResource::from_file(
            &self.path,
            metadata.len(),
            self.format,
        ))
    }

    async fn write_back(&self, transcript: &Transcript) -> Result<(), RegistryError> {
        self.store.replace(transcript).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::MemoryTranscriptStore;

    fn library() -> (tempfile::TempDir, Arc<MemoryTranscriptStore>, LibraryResolver) {
        let dir = tempfile::TempDir::new().unwrap();
        let kind_dir = dir.path().join("podcast_segment");
        std::fs::create_dir_all(&kind_dir).unwrap();
        std::fs::write(kind_dir.join("7.mp3"), vec![0u8; 2048]).unwrap();

        let store = Arc::new(MemoryTranscriptStore::new());
        let resolver = LibraryResolver::new(
            dir.path(),
            EntityKind::podcast_segment(),
            ByteSize::mib(10),
            store.clone(),
        );
        (dir, store, resolver)
    }

    #[tokio::test]
    async fn resolves_file_by_id_with_detected_format() {
        let (_dir, _store, resolver) = library();

        let entity = resolver.resolve(7).await.unwrap();
        let audio = entity.audio().await.unwrap();

        assert_eq!(entity.owner().to_string(), "podcast_segment#7");
        assert_eq!(audio.size_bytes(), 2048);
        assert_eq!(audio.format(), AudioFormat::Mp3);
        assert!(!audio.is_temporary());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (_dir, _store, resolver) = library();
        assert!(matches!(
            resolver.resolve(8).await.err(),
            Some(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn write_back_replaces_in_store() {
        let (_dir, store, resolver) = library();
        let entity = resolver.resolve(7).await.unwrap();

        entity
            .write_back(&Transcript::new(entity.owner().clone(), "text", 1))
            .await
            .unwrap();

        let stored = store.load(entity.owner()).await.unwrap().unwrap();
        assert_eq!(stored.text, "text");
    }
}
