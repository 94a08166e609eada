//! Transcription domain module

mod fragment;
mod job;
mod owner;
mod segment;
mod transcript;

pub use fragment::{reassemble, TranscriptFragment, FRAGMENT_SEPARATOR};
pub use job::{InvalidJobTransition, JobProgress, JobState};
pub use owner::{EntityKind, OwnerRef};
pub use segment::{check_partition, PartitionViolation, TimeRange, TranscriptionSegment};
pub use transcript::Transcript;
