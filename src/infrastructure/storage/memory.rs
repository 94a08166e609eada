//! In-process transcript store

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{StoreError, TranscriptStore};
use crate::domain::transcription::{OwnerRef, Transcript};

/// Keeps transcripts in a map. Used by `--no-save` style dry runs and tests.
#[derive(Default)]
pub struct MemoryTranscriptStore {
    transcripts: Mutex<HashMap<OwnerRef, Transcript>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.transcripts.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn replace(&self, transcript: &Transcript) -> Result<(), StoreError> {
        let mut map = self.transcripts.lock().map_err(|e| StoreError::WriteFailed {
            owner: transcript.owner.clone(),
            message: e.to_string(),
        })?;
        map.insert(transcript.owner.clone(), transcript.clone());
        Ok(())
    }

    async fn load(&self, owner: &OwnerRef) -> Result<Option<Transcript>, StoreError> {
        let map = self.transcripts.lock().map_err(|e| StoreError::ReadFailed {
            owner: owner.clone(),
            message: e.to_string(),
        })?;
        Ok(map.get(owner).cloned())
    }
}
