//! Audio domain module

mod audio_data;
mod resource;

pub use audio_data::{AudioData, AudioFormat};
pub use resource::AudioResource;
