//! Final transcript entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OwnerRef;

/// A complete transcript for one owner. Re-transcribing the same owner
/// replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub owner: OwnerRef,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub source_segment_count: u32,
}

impl Transcript {
    pub fn new(owner: OwnerRef, text: impl Into<String>, source_segment_count: u32) -> Self {
        Self {
            owner,
            text: text.into(),
            created_at: Utc::now(),
            source_segment_count,
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
