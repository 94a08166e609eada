//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod audio;
pub mod config;
pub mod error;
pub mod transcription;
pub mod units;

// Re-export common types
pub use audio::{AudioData, AudioFormat, AudioResource};
pub use config::AppConfig;
pub use error::*;
pub use transcription::{
    EntityKind, JobState, OwnerRef, TimeRange, Transcript, TranscriptFragment,
    TranscriptionSegment,
};
pub use units::{ByteSize, Duration};
