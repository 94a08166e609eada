//! FFmpeg-based encoder and slicer adapter

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempPath;
use tokio::fs;
use tokio::process::Command;

use crate::application::ports::{AudioEncoder, AudioSlicer, EncodingError};
use crate::domain::audio::{AudioFormat, AudioResource};
use crate::domain::config::{AppConfig, DEFAULT_BITRATE_KBPS, DEFAULT_ENCODER_TIMEOUT};
use crate::domain::transcription::TimeRange;
use crate::domain::units::Duration;

/// Target container for encoded audio
const TARGET_FORMAT: AudioFormat = AudioFormat::Ogg;

/// Transcodes with `ffmpeg` and measures with `ffprobe`
pub struct FfmpegEncoder {
    ffmpeg: String,
    ffprobe: String,
    bitrate_kbps: u32,
    timeout: Duration,
}

impl FfmpegEncoder {
    /// Create an encoder using `ffmpeg`/`ffprobe` from `PATH`
    pub fn new() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
            timeout: DEFAULT_ENCODER_TIMEOUT,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_or_default().to_string(),
            ffprobe: config.ffprobe_or_default().to_string(),
            bitrate_kbps: config.bitrate_kbps_or_default(),
            timeout: config.encoder_timeout_or_default(),
        }
    }

    pub fn with_tools(mut self, ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self.ffprobe = ffprobe.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build FFmpeg args for transcoding (optimized for speech)
    fn build_encode_args(&self, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vn".to_string(), // Drop cover art and video
            "-ar".to_string(),
            "16000".to_string(), // 16kHz sample rate
            "-ac".to_string(),
            "1".to_string(), // Mono
            "-c:a".to_string(),
            "libopus".to_string(),
            "-b:a".to_string(),
            format!("{}k", self.bitrate_kbps),
            "-application".to_string(),
            "voip".to_string(), // Optimize for voice
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Build FFmpeg args for cutting `range` out without re-encoding
    fn build_extract_args(input: &Path, range: TimeRange, output: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-ss".to_string(),
            format_seconds(range.start_ms),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-t".to_string(),
            format_seconds(range.len_ms()),
            "-vn".to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    fn build_probe_args(input: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            input.to_string_lossy().to_string(),
        ]
    }

    /// Run a tool to completion under the configured timeout, returning stdout
    async fn run_tool(&self, tool: &str, args: Vec<String>) -> Result<Vec<u8>, EncodingError> {
        tracing::debug!(tool, args = ?args, "Spawning encoder process");

        let child = Command::new(tool)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncodingError::ToolNotFound(tool.to_string())
                } else {
                    EncodingError::SpawnFailed {
                        tool: tool.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        // Dropping the wait future on timeout drops (and kills) the child.
        let output = tokio::time::timeout(self.timeout.as_std(), child.wait_with_output())
            .await
            .map_err(|_| EncodingError::TimedOut(self.timeout))?
            .map_err(|e| EncodingError::Io(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EncodingError::ProcessFailed {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr: stderr
                    .lines()
                    .rev()
                    .find(|l| !l.trim().is_empty())
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        Ok(output.stdout)
    }

    fn temp_output(format: AudioFormat) -> Result<TempPath, EncodingError> {
        tempfile::Builder::new()
            .prefix("podscribe-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile()
            .map(|f| f.into_temp_path())
            .map_err(|e| EncodingError::Io(e.to_string()))
    }

    /// Wrap a finished output file, rejecting empty ones
    async fn finish(temp: TempPath, format: AudioFormat) -> Result<AudioResource, EncodingError> {
        let size = fs::metadata(&temp)
            .await
            .map_err(|e| EncodingError::Io(e.to_string()))?
            .len();
        if size == 0 {
            return Err(EncodingError::EmptyOutput);
        }
        Ok(AudioResource::temporary(temp, size, format))
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioEncoder for FfmpegEncoder {
    fn needs_encoding(&self, source: &AudioResource) -> bool {
        source.format() != TARGET_FORMAT
    }

    async fn encode(&self, source: &AudioResource) -> Result<AudioResource, EncodingError> {
        let temp = Self::temp_output(TARGET_FORMAT)?;
        let args = self.build_encode_args(source.path(), &temp);

        self.run_tool(&self.ffmpeg, args).await?;
        let encoded = Self::finish(temp, TARGET_FORMAT).await?;

        tracing::info!(
            from = source.format().extension(),
            source_bytes = source.size_bytes(),
            encoded_bytes = encoded.size_bytes(),
            bitrate_kbps = self.bitrate_kbps,
            "Encoded source audio"
        );
        Ok(encoded)
    }
}

#[async_trait]
impl AudioSlicer for FfmpegEncoder {
    async fn probe_duration_ms(&self, audio: &AudioResource) -> Result<u64, EncodingError> {
        let stdout = self
            .run_tool(&self.ffprobe, Self::build_probe_args(audio.path()))
            .await?;
        parse_probe_output(&String::from_utf8_lossy(&stdout))
    }

    async fn extract(
        &self,
        source: &AudioResource,
        range: TimeRange,
    ) -> Result<AudioResource, EncodingError> {
        let format = source.format();
        let temp = Self::temp_output(format)?;
        let args = Self::build_extract_args(source.path(), range, &temp);

        self.run_tool(&self.ffmpeg, args).await?;
        let slice = Self::finish(temp, format).await?;
        Ok(slice.with_duration_ms(range.len_ms()))
    }
}

/// Milliseconds as an ffmpeg time argument ("12.345")
fn format_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

/// Parse ffprobe's `format=duration` output (seconds, fractional)
fn parse_probe_output(output: &str) -> Result<u64, EncodingError> {
    let trimmed = output.trim();
    let secs: f64 = trimmed
        .parse()
        .map_err(|_| EncodingError::Probe(format!("unexpected ffprobe output: {:?}", trimmed)))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(EncodingError::Probe(format!("invalid duration: {}", trimmed)));
    }
    Ok((secs * 1000.0).round() as u64)
}
