//! Transcription job state machine

use std::fmt;
use thiserror::Error;

/// Phases of one chunked transcription job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobState {
    #[default]
    Resolving,
    Encoding,
    Segmenting,
    Dispatching,
    Collecting,
    Reassembling,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::Encoding => "encoding",
            Self::Segmenting => "segmenting",
            Self::Dispatching => "dispatching",
            Self::Collecting => "collecting",
            Self::Reassembling => "reassembling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid job transition: {from} -> {to}")]
pub struct InvalidJobTransition {
    pub from: JobState,
    pub to: JobState,
}

/// Tracks the phase of a single job.
///
/// State machine:
///   RESOLVING -> ENCODING -> SEGMENTING -> DISPATCHING -> COLLECTING -> REASSEMBLING -> COMPLETED
///   RESOLVING -> SEGMENTING (encoding skipped)
///   any non-terminal -> FAILED | CANCELLED
#[derive(Debug, Default)]
pub struct JobProgress {
    state: JobState,
}

impl JobProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn advance(&mut self, to: JobState) -> Result<(), InvalidJobTransition> {
        use JobState::*;

        let allowed = match (self.state, to) {
            (from, Failed | Cancelled) => !from.is_terminal(),
            (Resolving, Encoding | Segmenting) => true,
            (Encoding, Segmenting) => true,
            (Segmenting, Dispatching) => true,
            (Dispatching, Collecting) => true,
            (Collecting, Reassembling) => true,
            (Reassembling, Completed) => true,
            _ => false,
        };

        if !allowed {
            return Err(InvalidJobTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_happy_path() {
        let mut job = JobProgress::new();
        for next in [
            JobState::Encoding,
            JobState::Segmenting,
            JobState::Dispatching,
            JobState::Collecting,
            JobState::Reassembling,
            JobState::Completed,
        ] {
            job.advance(next).unwrap();
        }
        assert_eq!(job.state(), JobState::Completed);
    }

    #[test]
    fn encoding_may_be_skipped() {
        let mut job = JobProgress::new();
        assert!(job.advance(JobState::Segmenting).is_ok());
    }

    #[test]
    fn cannot_skip_collection() {
        let mut job = JobProgress::new();
        job.advance(JobState::Segmenting).unwrap();
        job.advance(JobState::Dispatching).unwrap();
        let err = job.advance(JobState::Reassembling).unwrap_err();
        assert_eq!(err.from, JobState::Dispatching);
    }

    #[test]
    fn terminal_states_are_final() {
        let mut job = JobProgress::new();
        job.advance(JobState::Failed).unwrap();
        assert!(job.advance(JobState::Cancelled).is_err());
        assert!(job.advance(JobState::Encoding).is_err());
    }
}
