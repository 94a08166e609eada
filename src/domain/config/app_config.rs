//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::units::{ByteSize, Duration};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";
pub const DEFAULT_MAX_PAYLOAD: ByteSize = ByteSize::mib(10);
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_mins(2);
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
pub const DEFAULT_MIN_SEGMENT: Duration = Duration::from_secs(1);
pub const DEFAULT_BITRATE_KBPS: u32 = 32;
pub const DEFAULT_ENCODER_TIMEOUT: Duration = Duration::from_mins(10);

/// External encoder settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub bitrate_kbps: Option<u32>,
    pub ffmpeg: Option<String>,
    pub ffprobe: Option<String>,
    pub timeout: Option<String>,
}

/// Where entity audio is read from and transcripts are written to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub library_dir: Option<String>,
    pub transcript_dir: Option<String>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base_url: Option<String>,
    pub max_payload: Option<String>,
    pub max_concurrency: Option<usize>,
    pub max_attempts: Option<u32>,
    pub call_timeout: Option<String>,
    pub backoff: Option<String>,
    pub max_backoff: Option<String>,
    pub min_segment: Option<String>,
    pub log_format: Option<String>,
    pub encoder: Option<EncoderConfig>,
    pub storage: Option<StorageConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            api_key: None,
            model: Some(DEFAULT_MODEL.to_string()),
            api_base_url: None,
            max_payload: Some(DEFAULT_MAX_PAYLOAD.to_string()),
            max_concurrency: Some(DEFAULT_MAX_CONCURRENCY),
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            call_timeout: Some(DEFAULT_CALL_TIMEOUT.to_string()),
            backoff: Some(DEFAULT_BACKOFF.to_string()),
            max_backoff: Some(DEFAULT_MAX_BACKOFF.to_string()),
            min_segment: Some(DEFAULT_MIN_SEGMENT.to_string()),
            log_format: Some("pretty".to_string()),
            encoder: Some(EncoderConfig {
                bitrate_kbps: Some(DEFAULT_BITRATE_KBPS),
                ffmpeg: Some("ffmpeg".to_string()),
                ffprobe: Some("ffprobe".to_string()),
                timeout: Some(DEFAULT_ENCODER_TIMEOUT.to_string()),
            }),
            storage: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_key: other.api_key.or(self.api_key),
            model: other.model.or(self.model),
            api_base_url: other.api_base_url.or(self.api_base_url),
            max_payload: other.max_payload.or(self.max_payload),
            max_concurrency: other.max_concurrency.or(self.max_concurrency),
            max_attempts: other.max_attempts.or(self.max_attempts),
            call_timeout: other.call_timeout.or(self.call_timeout),
            backoff: other.backoff.or(self.backoff),
            max_backoff: other.max_backoff.or(self.max_backoff),
            min_segment: other.min_segment.or(self.min_segment),
            log_format: other.log_format.or(self.log_format),
            encoder: Self::merge_encoder(self.encoder, other.encoder),
            storage: Self::merge_storage(self.storage, other.storage),
        }
    }

    fn merge_encoder(
        base: Option<EncoderConfig>,
        other: Option<EncoderConfig>,
    ) -> Option<EncoderConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(EncoderConfig {
                bitrate_kbps: o.bitrate_kbps.or(b.bitrate_kbps),
                ffmpeg: o.ffmpeg.or(b.ffmpeg),
                ffprobe: o.ffprobe.or(b.ffprobe),
                timeout: o.timeout.or(b.timeout),
            }),
        }
    }

    fn merge_storage(
        base: Option<StorageConfig>,
        other: Option<StorageConfig>,
    ) -> Option<StorageConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(StorageConfig {
                library_dir: o.library_dir.or(b.library_dir),
                transcript_dir: o.transcript_dir.or(b.transcript_dir),
            }),
        }
    }

    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn max_payload_or_default(&self) -> ByteSize {
        self.max_payload
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_PAYLOAD)
    }

    /// Concurrency is clamped to at least one call
    pub fn max_concurrency_or_default(&self) -> usize {
        self.max_concurrency
            .unwrap_or(DEFAULT_MAX_CONCURRENCY)
            .max(1)
    }

    pub fn max_attempts_or_default(&self) -> u32 {
        self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS).max(1)
    }

    pub fn call_timeout_or_default(&self) -> Duration {
        Self::parse_duration(&self.call_timeout, DEFAULT_CALL_TIMEOUT)
    }

    pub fn backoff_or_default(&self) -> Duration {
        Self::parse_duration(&self.backoff, DEFAULT_BACKOFF)
    }

    pub fn max_backoff_or_default(&self) -> Duration {
        Self::parse_duration(&self.max_backoff, DEFAULT_MAX_BACKOFF)
    }

    pub fn min_segment_or_default(&self) -> Duration {
        Self::parse_duration(&self.min_segment, DEFAULT_MIN_SEGMENT)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format
            .as_deref()
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    pub fn bitrate_kbps_or_default(&self) -> u32 {
        self.encoder
            .as_ref()
            .and_then(|e| e.bitrate_kbps)
            .unwrap_or(DEFAULT_BITRATE_KBPS)
    }

    pub fn ffmpeg_or_default(&self) -> &str {
        self.encoder
            .as_ref()
            .and_then(|e| e.ffmpeg.as_deref())
            .unwrap_or("ffmpeg")
    }

    pub fn ffprobe_or_default(&self) -> &str {
        self.encoder
            .as_ref()
            .and_then(|e| e.ffprobe.as_deref())
            .unwrap_or("ffprobe")
    }

    pub fn encoder_timeout_or_default(&self) -> Duration {
        let timeout = self.encoder.as_ref().and_then(|e| e.timeout.clone());
        Self::parse_duration(&timeout, DEFAULT_ENCODER_TIMEOUT)
    }

    pub fn library_dir(&self) -> Option<&str> {
        self.storage.as_ref().and_then(|s| s.library_dir.as_deref())
    }

    pub fn transcript_dir(&self) -> Option<&str> {
        self.storage
            .as_ref()
            .and_then(|s| s.transcript_dir.as_deref())
    }

    fn parse_duration(value: &Option<String>, default: Duration) -> Duration {
        value
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }
}
