//! Chunked transcription use case
//!
//! Drives one job from an entity reference to a stored transcript:
//! resolve, encode when needed, segment under the payload cap, fan the
//! segments out to the worker pool, then reassemble by order and write back.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::error::InvalidInputError;
use crate::domain::transcription::{
    reassemble, InvalidJobTransition, JobProgress, JobState, OwnerRef, Transcript,
    TranscriptFragment,
};
use crate::domain::units::ByteSize;

use super::cancellation::JobCancellation;
use super::pool::{SegmentProgress, WorkerPool};
use super::ports::{AudioEncoder, EncodingError, RegistryError, TranscriptListener};
use super::registry::TranscribableRegistry;
use super::segmenter::{SegmentationError, Segmenter};
use super::worker::{SegmentFailure, TranscriptionWorker};

/// Some segments failed permanently; nothing was persisted.
#[derive(Debug)]
pub struct PartialTranscriptionError {
    pub owner: OwnerRef,
    /// Sorted by segment order
    pub failures: Vec<SegmentFailure>,
    /// Fragments that did complete, sorted by order
    pub completed: Vec<TranscriptFragment>,
    pub total_segments: usize,
}

impl PartialTranscriptionError {
    pub fn failed_orders(&self) -> Vec<u32> {
        self.failures.iter().map(|f| f.order).collect()
    }
}

impl fmt::Display for PartialTranscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} of {} segment(s) failed (orders {:?})",
            self.owner,
            self.failures.len(),
            self.total_segments,
            self.failed_orders()
        )?;
        if let Some(first) = self.failures.first() {
            write!(f, ": {}", first.cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for PartialTranscriptionError {}

/// Job-level errors. Every variant past resolution names the owner.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{owner}: {source}")]
    InvalidInput {
        owner: OwnerRef,
        source: InvalidInputError,
    },

    #[error("{owner}: encoding failed: {source}")]
    Encoding {
        owner: OwnerRef,
        source: EncodingError,
    },

    #[error("{owner}: segmentation failed: {source}")]
    Segmentation {
        owner: OwnerRef,
        source: SegmentationError,
    },

    #[error(transparent)]
    PartialTranscription(#[from] PartialTranscriptionError),

    #[error("{owner}: cancelled while {phase}")]
    Cancelled { owner: OwnerRef, phase: JobState },

    #[error("{owner}: storing transcript failed: {source}")]
    WriteBack {
        owner: OwnerRef,
        source: RegistryError,
    },

    #[error(transparent)]
    State(#[from] InvalidJobTransition),
}

impl JobError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Caller-side problems: bad kind, missing entity, empty audio
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::Registry(RegistryError::UnknownKind(_) | RegistryError::NotFound(_))
        )
    }

    fn terminal_state(&self) -> JobState {
        if self.is_cancelled() {
            JobState::Cancelled
        } else {
            JobState::Failed
        }
    }
}

/// Input parameters for one job
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub kind: String,
    pub id: u64,
    /// Overrides the entity's own payload cap
    pub max_payload: Option<ByteSize>,
    /// Write the transcript back and notify listeners
    pub save: bool,
}

impl JobRequest {
    pub fn new(kind: impl Into<String>, id: u64) -> Self {
        Self {
            kind: kind.into(),
            id,
            max_payload: None,
            save: true,
        }
    }
}

/// Output from a completed job
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub transcript: Transcript,
    /// Size of the audio that was segmented, after any encoding
    pub audio_bytes: u64,
    pub encoded: bool,
    pub saved: bool,
}

/// Callbacks for progress and status updates
#[derive(Default)]
#[allow(clippy::type_complexity)]
pub struct JobCallbacks {
    /// Called on every state change
    pub on_state: Option<Box<dyn Fn(JobState) + Send + Sync>>,
    /// Called once segmentation is done with the segment count
    pub on_segments_planned: Option<Box<dyn Fn(usize) + Send + Sync>>,
    /// Called as segments finish with (finished, total)
    pub on_segment_done: Option<Box<SegmentProgress>>,
}

/// Chunked transcription orchestrator
pub struct ChunkingTranscriber {
    registry: TranscribableRegistry,
    encoder: Arc<dyn AudioEncoder>,
    segmenter: Segmenter,
    worker: Arc<TranscriptionWorker>,
    pool: WorkerPool,
    listeners: Vec<Arc<dyn TranscriptListener>>,
}

impl ChunkingTranscriber {
    pub fn new(
        registry: TranscribableRegistry,
        encoder: Arc<dyn AudioEncoder>,
        segmenter: Segmenter,
        worker: TranscriptionWorker,
        pool: WorkerPool,
    ) -> Self {
        Self {
            registry,
            encoder,
            segmenter,
            worker: Arc::new(worker),
            pool,
            listeners: Vec::new(),
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn TranscriptListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn registry(&self) -> &TranscribableRegistry {
        &self.registry
    }

    /// Execute one job to completion, failure or cancellation
    pub async fn run(
        &self,
        request: &JobRequest,
        callbacks: &JobCallbacks,
        cancel: &JobCancellation,
    ) -> Result<JobOutput, JobError> {
        let mut progress = JobProgress::new();
        Self::emit(callbacks, progress.state());

        let result = self.execute(request, callbacks, cancel, &mut progress).await;

        if let Err(ref e) = result {
            let terminal = e.terminal_state();
            if progress.advance(terminal).is_ok() {
                Self::emit(callbacks, terminal);
            }
            tracing::error!(kind = %request.kind, id = request.id, error = %e, "Transcription job ended");
        }
        result
    }

    async fn execute(
        &self,
        request: &JobRequest,
        callbacks: &JobCallbacks,
        cancel: &JobCancellation,
        progress: &mut JobProgress,
    ) -> Result<JobOutput, JobError> {
        let entity = self.registry.resolve(&request.kind, request.id).await?;
        let owner = entity.owner().clone();
        let max_payload = request.max_payload.unwrap_or_else(|| entity.max_payload());
        let cancelled = |phase| JobError::Cancelled {
            owner: owner.clone(),
            phase,
        };

        let source = entity.audio().await?;
        if source.size_bytes() == 0 {
            return Err(JobError::InvalidInput {
                owner: owner.clone(),
                source: InvalidInputError::new("source audio is empty (0 bytes)"),
            });
        }
        if cancel.is_cancelled() {
            return Err(cancelled(progress.state()));
        }
        tracing::info!(
            owner = %owner,
            bytes = source.size_bytes(),
            format = %source.format().extension(),
            max_payload = %max_payload,
            "Starting transcription job"
        );

        // Encode
        let encoded = self.encoder.needs_encoding(&source);
        let audio = if encoded {
            Self::advance(progress, callbacks, JobState::Encoding)?;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(JobState::Encoding)),
                result = self.encoder.encode(&source) => result.map_err(|source| JobError::Encoding {
                    owner: owner.clone(),
                    source,
                })?,
            }
        } else {
            source
        };
        let audio_bytes = audio.size_bytes();

        // Segment
        Self::advance(progress, callbacks, JobState::Segmenting)?;
        let segments = match self.segmenter.segment(audio, max_payload, cancel).await {
            Ok(segments) => segments,
            Err(SegmentationError::Cancelled) => return Err(cancelled(JobState::Segmenting)),
            Err(SegmentationError::InvalidInput(source)) => {
                return Err(JobError::InvalidInput {
                    owner: owner.clone(),
                    source,
                })
            }
            Err(source) => {
                return Err(JobError::Segmentation {
                    owner: owner.clone(),
                    source,
                })
            }
        };
        let total_segments = segments.len();
        tracing::info!(owner = %owner, segments = total_segments, "Segmentation complete");
        if let Some(ref cb) = callbacks.on_segments_planned {
            cb(total_segments);
        }

        // Dispatch and collect
        Self::advance(progress, callbacks, JobState::Dispatching)?;
        let no_progress = |_: usize, _: usize| {};
        let on_done: &SegmentProgress = match callbacks.on_segment_done {
            Some(ref cb) => cb.as_ref(),
            None => &no_progress,
        };
        let outcome = self
            .pool
            .run(Arc::clone(&self.worker), segments, cancel, on_done)
            .await;

        if outcome.cancelled {
            let phase = if outcome.dispatched < total_segments {
                JobState::Dispatching
            } else {
                JobState::Collecting
            };
            return Err(cancelled(phase));
        }
        Self::advance(progress, callbacks, JobState::Collecting)?;

        if !outcome.failures.is_empty() {
            let mut failures = outcome.failures;
            failures.sort_by_key(|f| f.order);
            let mut completed = outcome.fragments;
            completed.sort_by_key(|f| f.order);
            return Err(PartialTranscriptionError {
                owner: owner.clone(),
                failures,
                completed,
                total_segments,
            }
            .into());
        }

        // Reassemble
        Self::advance(progress, callbacks, JobState::Reassembling)?;
        let text = reassemble(outcome.fragments);
        let transcript = Transcript::new(owner.clone(), text, total_segments as u32);

        if request.save {
            entity
                .write_back(&transcript)
                .await
                .map_err(|source| JobError::WriteBack {
                    owner: owner.clone(),
                    source,
                })?;
            self.publish(&transcript).await;
        }

        Self::advance(progress, callbacks, JobState::Completed)?;
        tracing::info!(
            owner = %owner,
            segments = total_segments,
            words = transcript.word_count(),
            saved = request.save,
            "Transcription job completed"
        );

        Ok(JobOutput {
            transcript,
            audio_bytes,
            encoded,
            saved: request.save,
        })
    }

    /// Listener failures are logged and otherwise ignored.
    async fn publish(&self, transcript: &Transcript) {
        for listener in &self.listeners {
            if let Err(message) = listener.on_transcript(transcript).await {
                tracing::warn!(owner = %transcript.owner, error = %message, "Transcript listener failed");
            }
        }
    }

    fn advance(
        progress: &mut JobProgress,
        callbacks: &JobCallbacks,
        to: JobState,
    ) -> Result<(), InvalidJobTransition> {
        progress.advance(to)?;
        tracing::debug!(state = %to, "Job state changed");
        Self::emit(callbacks, to);
        Ok(())
    }

    fn emit(callbacks: &JobCallbacks, state: JobState) {
        if let Some(ref cb) = callbacks.on_state {
            cb(state);
        }
    }
}
