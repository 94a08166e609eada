//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like FFmpeg, the Gemini API and the
//! local filesystem.

pub mod config;
pub mod encoding;
pub mod library;
pub mod observability;
pub mod storage;
pub mod transcription;

// Re-export adapters
pub use config::XdgConfigStore;
pub use encoding::FfmpegEncoder;
pub use library::LibraryResolver;
pub use storage::{FileTranscriptStore, MemoryTranscriptStore};
pub use transcription::GeminiTranscriber;
