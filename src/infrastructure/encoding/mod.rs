//! Audio encoding adapters

mod ffmpeg;

pub use ffmpeg::FfmpegEncoder;
