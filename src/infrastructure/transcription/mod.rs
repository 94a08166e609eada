//! Transcription backend adapters

mod gemini;

pub use gemini::{GeminiTranscriber, DEFAULT_API_BASE_URL};
