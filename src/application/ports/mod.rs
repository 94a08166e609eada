//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod encoder;
pub mod listener;
pub mod transcribable;
pub mod transcriber;
pub mod transcript_store;

// Re-export common types
pub use config::ConfigStore;
pub use encoder::{AudioEncoder, AudioSlicer, EncodingError};
pub use listener::TranscriptListener;
pub use transcribable::{RegistryError, Transcribable, TranscribableResolver, UnknownKindError};
pub use transcriber::{Transcriber, TranscriptionError};
pub use transcript_store::{StoreError, TranscriptStore};
