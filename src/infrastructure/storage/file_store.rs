//! JSON file transcript store

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{StoreError, TranscriptStore};
use crate::domain::transcription::{OwnerRef, Transcript};

/// Stores one JSON document per owner at `<root>/<kind>/<id>.json`.
///
/// Writes go to a unique sibling temp file which is then renamed over the target,
/// so readers never observe a half-written transcript.
pub struct FileTranscriptStore {
    root: PathBuf,
}

impl FileTranscriptStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, owner: &OwnerRef) -> PathBuf {
        self.root
            .join(owner.kind.as_str())
            .join(format!("{}.json", owner.id))
    }
}

/// Each write stages into its own uniquely named file in `dir`, so
/// concurrent writers for one owner never share a staging path.
fn persist_json(dir: &Path, target: &Path, json: &[u8]) -> std::io::Result<()> {
    let mut staging = tempfile::Builder::new()
        .prefix(".transcript-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    staging.write_all(json)?;
    staging.as_file().sync_all()?;
    staging.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn replace(&self, transcript: &Transcript) -> Result<(), StoreError> {
        let owner = &transcript.owner;
        let write_failed = |message: String| StoreError::WriteFailed {
            owner: owner.clone(),
            message,
        };

        let path = self.path_for(owner);
        let dir = path.parent().unwrap_or(self.root.as_path()).to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| write_failed(e.to_string()))?;

        let json =
            serde_json::to_vec_pretty(transcript).map_err(|e| write_failed(e.to_string()))?;
        let target = path.clone();
        tokio::task::spawn_blocking(move || persist_json(&dir, &target, &json))
            .await
            .map_err(|e| write_failed(e.to_string()))?
            .map_err(|e| write_failed(e.to_string()))?;

        tracing::debug!(owner = %owner, path = %path.display(), "Stored transcript");
        Ok(())
    }

    async fn load(&self, owner: &OwnerRef) -> Result<Option<Transcript>, StoreError> {
        let read_failed = |message: String| StoreError::ReadFailed {
            owner: owner.clone(),
            message,
        };

        let bytes = match fs::read(self.path_for(owner)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(read_failed(e.to_string())),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| read_failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transcription::EntityKind;

    fn create_test_store() -> (tempfile::TempDir, FileTranscriptStore) {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FileTranscriptStore::new(dir.path());
        (dir, store)
    }

    fn owner() -> OwnerRef {
        OwnerRef::new(EntityKind::podcast_segment(), 42)
    }

    #[test]
    fn path_layout_is_kind_then_id() {
        let store = FileTranscriptStore::new("/data/transcripts");
        assert_eq!(
            store.path_for(&owner()),
            PathBuf::from("/data/transcripts/podcast_segment/42.json")
        );
    }

    #[tokio::test]
    async fn missing_transcript_loads_as_none() {
        let (_dir, store) = create_test_store();
        assert!(store.load(&owner()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stored_transcript_loads_back() {
        let (_dir, store) = create_test_store();
        let transcript = Transcript::new(owner(), "a\nb\nc", 3);

        store.replace(&transcript).await.unwrap();

        assert_eq!(store.load(&owner()).await.unwrap(), Some(transcript));
    }

    #[tokio::test]
    async fn replace_overwrites_and_leaves_no_staging_file() {
        let (dir, store) = create_test_store();
        store
            .replace(&Transcript::new(owner(), "first", 1))
            .await
            .unwrap();
        store
            .replace(&Transcript::new(owner(), "second", 2))
            .await
            .unwrap();

        let loaded = store.load(&owner()).await.unwrap().unwrap();
        assert_eq!(loaded.text, "second");
        assert_eq!(loaded.source_segment_count, 2);

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("podcast_segment"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("42.json")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_replaces_for_one_owner_all_succeed() {
        let (dir, store) = create_test_store();
        let store = std::sync::Arc::new(store);

        let mut tasks = tokio::task::JoinSet::new();
        for n in 0..16u32 {
            let store = std::sync::Arc::clone(&store);
            tasks.spawn(async move {
                store
                    .replace(&Transcript::new(owner(), format!("take {}", n), n))
                    .await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        let loaded = store.load(&owner()).await.unwrap().unwrap();
        assert!(loaded.text.starts_with("take "));
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("podcast_segment"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("42.json")]);
    }

    #[tokio::test]
    async fn corrupt_file_is_read_error() {
        let (dir, store) = create_test_store();
        let path = dir.path().join("podcast_segment");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("42.json"), b"not json").unwrap();

        let err = store.load(&owner()).await.unwrap_err();
        assert!(matches!(err, StoreError::ReadFailed { .. }));
    }
}
