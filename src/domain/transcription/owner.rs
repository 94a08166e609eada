//! Owner references for transcribable entities

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidKindError;

/// Stable tag naming a kind of transcribable entity (e.g. `podcast_segment`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityKind(String);

impl EntityKind {
    pub const PODCAST_SEGMENT: &'static str = "podcast_segment";
    pub const ATTACHMENT: &'static str = "attachment";

    pub fn new(tag: impl Into<String>) -> Result<Self, InvalidKindError> {
        let tag = tag.into();
        let valid = !tag.is_empty()
            && tag
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if valid {
            Ok(Self(tag))
        } else {
            Err(InvalidKindError { input: tag })
        }
    }

    pub fn podcast_segment() -> Self {
        Self(Self::PODCAST_SEGMENT.to_string())
    }

    pub fn attachment() -> Self {
        Self(Self::ATTACHMENT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for EntityKind {
    type Err = InvalidKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntityKind {
    type Error = InvalidKindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `(kind, id)` pair identifying the entity a transcript belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub kind: EntityKind,
    pub id: u64,
}

impl OwnerRef {
    pub fn new(kind: EntityKind, id: u64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_stable_tags() {
        assert!(EntityKind::new("podcast_segment").is_ok());
        assert!(EntityKind::new("attachment-v2").is_ok());
    }

    #[test]
    fn rejects_malformed_tags() {
        assert!(EntityKind::new("").is_err());
        assert!(EntityKind::new("Podcast").is_err());
        assert!(EntityKind::new("a/b").is_err());
    }

    #[test]
    fn owner_display() {
        let owner = OwnerRef::new(EntityKind::podcast_segment(), 42);
        assert_eq!(owner.to_string(), "podcast_segment#42");
    }

    #[test]
    fn kind_deserialization_validates() {
        let ok: Result<EntityKind, _> = serde_json::from_str("\"attachment\"");
        assert!(ok.is_ok());
        let bad: Result<EntityKind, _> = serde_json::from_str("\"Not Valid\"");
        assert!(bad.is_err());
    }
}
