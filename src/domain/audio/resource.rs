//! Audio resource handle

use std::fmt;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use super::AudioFormat;

/// A file-backed audio source with a known size.
///
/// Resources produced by the encoder or by slice extraction own their
/// temporary file; it is deleted when the resource is dropped, whichever
/// path (success, error, cancellation) drops it. Not `Clone`: a resource
/// has exactly one owner at a time.
pub struct AudioResource {
    path: PathBuf,
    size_bytes: u64,
    format: AudioFormat,
    duration_ms: Option<u64>,
    temp: Option<TempPath>,
}

impl AudioResource {
    /// Wrap a file the caller keeps ownership of
    pub fn from_file(path: impl Into<PathBuf>, size_bytes: u64, format: AudioFormat) -> Self {
        Self {
            path: path.into(),
            size_bytes,
            format,
            duration_ms: None,
            temp: None,
        }
    }

    /// Wrap a temporary file; the resource deletes it on drop
    pub fn temporary(temp: TempPath, size_bytes: u64, format: AudioFormat) -> Self {
        Self {
            path: temp.to_path_buf(),
            size_bytes,
            format,
            duration_ms: None,
            temp: Some(temp),
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Duration if it has been probed or was known at creation
    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

impl fmt::Debug for AudioResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioResource")
            .field("path", &self.path)
            .field("size_bytes", &self.size_bytes)
            .field("format", &self.format)
            .field("duration_ms", &self.duration_ms)
            .field("temporary", &self.is_temporary())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_resource_removes_file_on_drop() {
        let temp = tempfile::NamedTempFile::new().unwrap().into_temp_path();
        let path = temp.to_path_buf();
        let resource = AudioResource::temporary(temp, 0, AudioFormat::Ogg);
        assert!(path.exists());
        assert!(resource.is_temporary());

        drop(resource);
        assert!(!path.exists());
    }

    #[test]
    fn borrowed_file_survives_drop() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let resource = AudioResource::from_file(file.path(), 10, AudioFormat::Mp3);
        drop(resource);
        assert!(file.path().exists());
    }

    #[test]
    fn duration_is_attached() {
        let resource =
            AudioResource::from_file("/x.ogg", 1, AudioFormat::Ogg).with_duration_ms(1500);
        assert_eq!(resource.duration_ms(), Some(1500));
    }
}
