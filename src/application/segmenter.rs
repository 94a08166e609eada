//! Size-bounded audio segmentation
//!
//! Cuts a source recording into time-ordered, non-overlapping slices that
//! each fit under the backend's payload cap. The first cut assumes a
//! near-constant bitrate; any slice that still comes out too large (VBR
//! sources) is bisected and re-extracted until it fits.

use std::collections::VecDeque;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::audio::AudioResource;
use crate::domain::config::DEFAULT_MIN_SEGMENT;
use crate::domain::error::InvalidInputError;
use crate::domain::transcription::{TimeRange, TranscriptionSegment};
use crate::domain::units::{ByteSize, Duration};

use super::cancellation::JobCancellation;
use super::ports::{AudioSlicer, EncodingError};

/// Segmentation errors
#[derive(Debug, Clone, Error)]
pub enum SegmentationError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    #[error("Slice extraction failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Slice {range} is {size_bytes} bytes, above the {max_payload} cap, and cannot be split further")]
    CannotFit {
        range: TimeRange,
        size_bytes: u64,
        max_payload: ByteSize,
    },

    #[error("Segmentation cancelled")]
    Cancelled,
}

/// Compute the initial constant-bitrate cut plan for a source.
///
/// Sources at or under the cap get one range spanning the whole timeline.
/// Larger sources get `ceil(size / cap)` equal ranges, the last one absorbing
/// the rounding remainder.
pub fn plan_ranges(
    total_ms: u64,
    total_bytes: u64,
    max_payload: ByteSize,
) -> Result<Vec<TimeRange>, InvalidInputError> {
    if total_bytes == 0 {
        return Err(InvalidInputError::new("source audio is empty (0 bytes)"));
    }
    if total_ms == 0 {
        return Err(InvalidInputError::new("source audio has zero duration"));
    }
    let cap = max_payload.as_u64();
    if cap == 0 {
        return Err(InvalidInputError::new("payload cap must be at least 1 byte"));
    }

    if total_bytes <= cap {
        return Ok(vec![TimeRange::new(0, total_ms)]);
    }

    // Never plan ranges shorter than 1 ms.
    let count = total_bytes.div_ceil(cap).min(total_ms);
    let per_segment = total_ms / count;

    Ok((0..count)
        .map(|i| {
            let start = i * per_segment;
            let stop = if i + 1 == count {
                total_ms
            } else {
                start + per_segment
            };
            TimeRange::new(start, stop)
        })
        .collect())
}

/// Splits audio into size-compliant [`TranscriptionSegment`]s
pub struct Segmenter {
    slicer: Arc<dyn AudioSlicer>,
    min_segment_ms: u64,
}

impl Segmenter {
    pub fn new(slicer: Arc<dyn AudioSlicer>) -> Self {
        Self {
            slicer,
            min_segment_ms: DEFAULT_MIN_SEGMENT.as_millis(),
        }
    }

    /// Shortest slice bisection may produce. Ranges whose halves would be
    /// shorter than this fail with [`SegmentationError::CannotFit`].
    pub fn with_min_segment(mut self, min: Duration) -> Self {
        self.min_segment_ms = min.as_millis().max(1);
        self
    }

    /// Segment `audio` so that every slice is at most `max_payload` bytes.
    ///
    /// Takes ownership of the source: when it fits whole it becomes the
    /// single segment, otherwise it is dropped once all slices are extracted.
    pub async fn segment(
        &self,
        audio: AudioResource,
        max_payload: ByteSize,
        cancel: &JobCancellation,
    ) -> Result<Vec<TranscriptionSegment>, SegmentationError> {
        if audio.size_bytes() == 0 {
            return Err(InvalidInputError::new("source audio is empty (0 bytes)").into());
        }

        let total_ms = match audio.duration_ms() {
            Some(ms) => ms,
            None => self.slicer.probe_duration_ms(&audio).await?,
        };
        let ranges = plan_ranges(total_ms, audio.size_bytes(), max_payload)?;

        if audio.size_bytes() <= max_payload.as_u64() {
            tracing::debug!(
                bytes = audio.size_bytes(),
                duration_ms = total_ms,
                "Source fits in one payload"
            );
            return Ok(vec![TranscriptionSegment {
                audio,
                order: 0,
                start_ms: 0,
                stop_ms: total_ms,
            }]);
        }

        tracing::info!(
            bytes = audio.size_bytes(),
            duration_ms = total_ms,
            planned = ranges.len(),
            max_payload = %max_payload,
            "Segmenting source"
        );

        let mut pending: VecDeque<TimeRange> = ranges.into();
        let mut segments = Vec::with_capacity(pending.len());

        while let Some(range) = pending.pop_front() {
            if cancel.is_cancelled() {
                return Err(SegmentationError::Cancelled);
            }

            let slice = self.slicer.extract(&audio, range).await?;
            if slice.size_bytes() <= max_payload.as_u64() {
                segments.push((range, slice));
                continue;
            }

            let size_bytes = slice.size_bytes();
            drop(slice);

            match range.bisect() {
                Some((left, right)) if left.len_ms() >= self.min_segment_ms => {
                    tracing::debug!(
                        %range,
                        bytes = size_bytes,
                        "Slice over cap, bisecting"
                    );
                    pending.push_front(right);
                    pending.push_front(left);
                }
                _ => {
                    return Err(SegmentationError::CannotFit {
                        range,
                        size_bytes,
                        max_payload,
                    })
                }
            }
        }

        Ok(segments
            .into_iter()
            .enumerate()
            .map(|(order, (range, audio))| TranscriptionSegment {
                audio: audio.with_duration_ms(range.len_ms()),
                order: order as u32,
                start_ms: range.start_ms,
                stop_ms: range.stop_ms,
            })
            .collect())
    }
}
