//! In-memory audio payload and container formats

use std::fmt;
use std::path::Path;

/// Audio container formats the pipeline knows how to name and hand to a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioFormat {
    #[default]
    Ogg,
    Mp3,
    Wav,
    Flac,
    Webm,
    Mp4,
    M4a,
}

impl AudioFormat {
    /// MIME type sent alongside the payload
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Ogg => "audio/ogg",
            Self::Mp3 => "audio/mp3",
            Self::Wav => "audio/wav",
            Self::Flac => "audio/flac",
            Self::Webm => "audio/webm",
            Self::Mp4 => "audio/mp4",
            Self::M4a => "audio/aac",
        }
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Ogg => "ogg",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Flac => "flac",
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
            Self::M4a => "m4a",
        }
    }

    pub const ALL: [AudioFormat; 7] = [
        Self::Ogg,
        Self::Mp3,
        Self::Wav,
        Self::Flac,
        Self::Webm,
        Self::Mp4,
        Self::M4a,
    ];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ogg" | "opus" | "oga" => Some(Self::Ogg),
            "mp3" | "mpeg" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            "flac" => Some(Self::Flac),
            "webm" => Some(Self::Webm),
            "mp4" => Some(Self::Mp4),
            "m4a" | "aac" => Some(Self::M4a),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}

/// Audio bytes loaded for a single backend call.
#[derive(Debug, Clone)]
pub struct AudioData {
    data: Vec<u8>,
    format: AudioFormat,
}

impl AudioData {
    pub fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        Self { data, format }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Encode the audio data as base64
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}
