//! Podscribe - chunked transcription of long-form audio
//!
//! Turns the audio attached to a podcast segment or an attachment into a
//! stored transcript. Oversized audio is re-encoded, cut into pieces that
//! fit the transcription backend's payload cap, transcribed concurrently
//! and stitched back together in timeline order.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects (owners, time ranges, fragments, units) and errors
//! - **Application**: The segmenter, worker, pool and orchestrator, plus port traits
//! - **Infrastructure**: Adapter implementations (FFmpeg, Gemini, file store, tracing)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
