//! Transcript store adapters

mod file_store;
mod memory;

pub use file_store::FileTranscriptStore;
pub use memory::MemoryTranscriptStore;
