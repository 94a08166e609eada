//! Per-segment transcription worker with retry

use std::sync::Arc;

use thiserror::Error;
use tokio::fs;

use crate::domain::audio::AudioData;
use crate::domain::transcription::{TranscriptFragment, TranscriptionSegment};
use crate::domain::units::Duration;

use super::ports::{Transcriber, TranscriptionError};

/// Retry and timeout settings for backend calls
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per segment, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    /// Upper bound on a single backend call
    pub call_timeout: Duration,
}

impl RetryPolicy {
    /// Backoff to wait after `attempt` (1-based) failed.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(32);
        let ms = self
            .base_backoff
            .as_millis()
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff.as_millis());
        Duration::from_millis(ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            call_timeout: Duration::from_mins(2),
        }
    }
}

/// A segment that ended in permanent failure
#[derive(Debug, Clone, Error)]
#[error("segment {order} failed after {attempts} attempt(s): {cause}")]
pub struct SegmentFailure {
    pub order: u32,
    pub attempts: u32,
    /// True when the last error was transient but the attempt cap ran out
    pub retries_exhausted: bool,
    pub cause: TranscriptionError,
}

/// Transcribes single segments against the backend
pub struct TranscriptionWorker {
    transcriber: Arc<dyn Transcriber>,
    policy: RetryPolicy,
}

impl TranscriptionWorker {
    pub fn new(transcriber: Arc<dyn Transcriber>, policy: RetryPolicy) -> Self {
        Self {
            transcriber,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Transcribe one segment, retrying transient failures.
    ///
    /// Consumes the segment; its audio (and any temporary file) is released
    /// when this returns.
    pub async fn transcribe(
        &self,
        segment: TranscriptionSegment,
    ) -> Result<TranscriptFragment, SegmentFailure> {
        let order = segment.order;
        let audio = match fs::read(segment.audio.path()).await {
            Ok(bytes) => AudioData::new(bytes, segment.audio.format()),
            Err(e) => {
                return Err(SegmentFailure {
                    order,
                    attempts: 0,
                    retries_exhausted: false,
                    cause: TranscriptionError::AudioUnreadable(e.to_string()),
                })
            }
        };
        drop(segment);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match tokio::time::timeout(
                self.policy.call_timeout.as_std(),
                self.transcriber.transcribe(&audio),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(TranscriptionError::Timeout(self.policy.call_timeout)),
            };

            match result {
                Ok(text) => {
                    tracing::debug!(order, attempt, chars = text.len(), "Segment transcribed");
                    return Ok(TranscriptFragment::new(order, text));
                }
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let wait = self.policy.backoff_after(attempt);
                    tracing::warn!(
                        order,
                        attempt,
                        error = %e,
                        retry_in = %wait,
                        "Transient transcription failure, retrying"
                    );
                    tokio::time::sleep(wait.as_std()).await;
                }
                Err(e) => {
                    let retries_exhausted = e.is_transient();
                    tracing::error!(
                        order,
                        attempt,
                        retries_exhausted,
                        error = %e,
                        "Segment transcription failed"
                    );
                    return Err(SegmentFailure {
                        order,
                        attempts: attempt,
                        retries_exhausted,
                        cause: e,
                    });
                }
            }
        }
    }
}
