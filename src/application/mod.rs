//! Application layer - Use cases and port interfaces
//!
//! Contains the chunked transcription pipeline and the trait definitions
//! for external system interactions.

pub mod cancellation;
pub mod orchestrator;
pub mod pool;
pub mod ports;
pub mod registry;
pub mod segmenter;
pub mod worker;

pub use cancellation::JobCancellation;
pub use orchestrator::{
    ChunkingTranscriber, JobCallbacks, JobError, JobOutput, JobRequest, PartialTranscriptionError,
};
pub use pool::{DispatchOutcome, SegmentProgress, WorkerPool};
pub use registry::TranscribableRegistry;
pub use segmenter::{plan_ranges, SegmentationError, Segmenter};
pub use worker::{RetryPolicy, SegmentFailure, TranscriptionWorker};
