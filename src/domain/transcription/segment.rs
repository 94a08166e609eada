//! Transcription segments and the time-range partition they form

use std::fmt;

use crate::domain::audio::AudioResource;

/// Half-open millisecond range `[start_ms, stop_ms)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start_ms: u64,
    pub stop_ms: u64,
}

impl TimeRange {
    pub const fn new(start_ms: u64, stop_ms: u64) -> Self {
        Self { start_ms, stop_ms }
    }

    pub const fn len_ms(&self) -> u64 {
        self.stop_ms.saturating_sub(self.start_ms)
    }

    /// Split at the midpoint. `None` when either half would be empty.
    pub fn bisect(&self) -> Option<(TimeRange, TimeRange)> {
        if self.len_ms() < 2 {
            return None;
        }
        let mid = self.start_ms + self.len_ms() / 2;
        Some((
            TimeRange::new(self.start_ms, mid),
            TimeRange::new(mid, self.stop_ms),
        ))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}ms, {}ms)", self.start_ms, self.stop_ms)
    }
}

/// One size-compliant slice of a source recording
#[derive(Debug)]
pub struct TranscriptionSegment {
    pub audio: AudioResource,
    pub order: u32,
    pub start_ms: u64,
    pub stop_ms: u64,
}

impl TranscriptionSegment {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_ms, self.stop_ms)
    }
}

/// Why a list of ranges is not an exact partition of `[0, total_ms)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionViolation {
    Empty,
    DoesNotStartAtZero(u64),
    Degenerate { index: usize },
    Gap { index: usize, expected: u64, found: u64 },
    DoesNotReachEnd { stop_ms: u64, total_ms: u64 },
}

/// Check that `ranges` cover `[0, total_ms)` with no gaps, overlaps or empty ranges.
pub fn check_partition(ranges: &[TimeRange], total_ms: u64) -> Result<(), PartitionViolation> {
    let first = ranges.first().ok_or(PartitionViolation::Empty)?;
    if first.start_ms != 0 {
        return Err(PartitionViolation::DoesNotStartAtZero(first.start_ms));
    }

    let mut cursor = 0;
    for (index, range) in ranges.iter().enumerate() {
        if range.start_ms != cursor {
            return Err(PartitionViolation::Gap {
                index,
                expected: cursor,
                found: range.start_ms,
            });
        }
        if range.stop_ms <= range.start_ms {
            return Err(PartitionViolation::Degenerate { index });
        }
        cursor = range.stop_ms;
    }

    if cursor != total_ms {
        return Err(PartitionViolation::DoesNotReachEnd {
            stop_ms: cursor,
            total_ms,
        });
    }
    Ok(())
}
