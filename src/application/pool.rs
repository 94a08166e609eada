//! Bounded-concurrency worker pool

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::domain::transcription::{TranscriptFragment, TranscriptionSegment};

use super::cancellation::JobCancellation;
use super::ports::TranscriptionError;
use super::worker::{SegmentFailure, TranscriptionWorker};

/// Progress callback. Parameters: (segments finished, segments total)
pub type SegmentProgress = dyn Fn(usize, usize) + Send + Sync;

/// Everything a dispatch round produced, in completion order
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub fragments: Vec<TranscriptFragment>,
    pub failures: Vec<SegmentFailure>,
    /// Segments that were handed to a worker
    pub dispatched: usize,
    pub cancelled: bool,
}

impl DispatchOutcome {
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failures.is_empty()
    }
}

/// Runs transcription workers with at most `max_concurrency` backend calls
/// in flight. One pool may be shared by concurrent jobs; the bound applies
/// across all of them.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl WorkerPool {
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Dispatch every segment and wait for all of them to finish.
    ///
    /// On cancellation no further segments are dispatched, undispatched
    /// segments are dropped (releasing their audio) and in-flight calls are
    /// aborted.
    pub async fn run(
        &self,
        worker: Arc<TranscriptionWorker>,
        segments: Vec<TranscriptionSegment>,
        cancel: &JobCancellation,
        on_progress: &SegmentProgress,
    ) -> DispatchOutcome {
        let total = segments.len();
        let mut outcome = DispatchOutcome::default();
        let mut outstanding = BTreeSet::new();
        let mut tasks = JoinSet::new();
        let mut pending = segments.into_iter();

        // Dispatch, collecting whatever finishes while waiting for permits.
        while pending.len() > 0 {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    outcome.cancelled = true;
                    break;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    Self::record(joined, &mut outcome, &mut outstanding);
                    on_progress(outcome.fragments.len() + outcome.failures.len(), total);
                }
                permit = Arc::clone(&self.semaphore).acquire_owned() => {
                    let (Ok(permit), Some(segment)) = (permit, pending.next()) else {
                        break;
                    };
                    tracing::debug!(
                        order = segment.order,
                        start_ms = segment.start_ms,
                        stop_ms = segment.stop_ms,
                        bytes = segment.audio.size_bytes(),
                        "Dispatching segment"
                    );
                    outstanding.insert(segment.order);
                    outcome.dispatched += 1;
                    let worker = Arc::clone(&worker);
                    tasks.spawn(async move {
                        let _permit = permit;
                        worker.transcribe(segment).await
                    });
                }
            }
        }
        drop(pending);

        if outcome.cancelled {
            tasks.abort_all();
        }

        // Collect.
        while !tasks.is_empty() {
            tokio::select! {
                biased;
                _ = cancel.cancelled(), if !outcome.cancelled => {
                    outcome.cancelled = true;
                    tasks.abort_all();
                }
                joined = tasks.join_next() => {
                    let Some(joined) = joined else { break };
                    Self::record(joined, &mut outcome, &mut outstanding);
                    if !outcome.cancelled {
                        on_progress(outcome.fragments.len() + outcome.failures.len(), total);
                    }
                }
            }
        }

        if !outcome.cancelled {
            // Tasks that panicked never reported back.
            for order in outstanding {
                outcome.failures.push(SegmentFailure {
                    order,
                    attempts: 0,
                    retries_exhausted: false,
                    cause: TranscriptionError::ApiError("worker task ended unexpectedly".into()),
                });
            }
        }

        outcome
    }

    fn record(
        joined: Result<Result<TranscriptFragment, SegmentFailure>, JoinError>,
        outcome: &mut DispatchOutcome,
        outstanding: &mut BTreeSet<u32>,
    ) {
        match joined {
            Ok(Ok(fragment)) => {
                outstanding.remove(&fragment.order);
                outcome.fragments.push(fragment);
            }
            Ok(Err(failure)) => {
                outstanding.remove(&failure.order);
                outcome.failures.push(failure);
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => tracing::error!(error = %e, "Transcription task panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Transcriber;
    use crate::application::worker::RetryPolicy;
    use crate::domain::audio::{AudioData, AudioFormat, AudioResource};
    use crate::domain::units::Duration;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sleeps `delay_ms` per payload byte value and tracks peak concurrency.
    struct TrackingTranscriber {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
        fail_on: Option<String>,
    }

    impl TrackingTranscriber {
        fn new(fail_on: Option<&str>) -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
                fail_on: fail_on.map(str::to_string),
            }
        }
    }

    #[async_trait]
    impl Transcriber for TrackingTranscriber {
        async fn transcribe(&self, audio: &AudioData) -> Result<String, TranscriptionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let text = String::from_utf8_lossy(audio.data()).into_owned();
            // Later letters finish first.
            let delay = 60u64.saturating_sub((text.as_bytes()[0] - b'a') as u64 * 10);
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail_on.as_deref() == Some(text.as_str()) {
                return Err(TranscriptionError::UnsupportedAudio("bad".into()));
            }
            Ok(text)
        }
    }

    fn segments(texts: &[&str]) -> Vec<TranscriptionSegment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let mut file = tempfile::NamedTempFile::new().unwrap();
                file.write_all(text.as_bytes()).unwrap();
                TranscriptionSegment {
                    audio: AudioResource::temporary(
                        file.into_temp_path(),
                        text.len() as u64,
                        AudioFormat::Ogg,
                    ),
                    order: i as u32,
                    start_ms: i as u64 * 1000,
                    stop_ms: (i as u64 + 1) * 1000,
                }
            })
            .collect()
    }

    fn worker(transcriber: Arc<TrackingTranscriber>) -> Arc<TranscriptionWorker> {
        Arc::new(TranscriptionWorker::new(
            transcriber,
            RetryPolicy {
                max_attempts: 1,
                call_timeout: Duration::from_secs(5),
                ..Default::default()
            },
        ))
    }

    fn no_progress() -> Box<SegmentProgress> {
        Box::new(|_, _| {})
    }

    #[tokio::test]
    async fn never_exceeds_concurrency_bound() {
        let transcriber = Arc::new(TrackingTranscriber::new(None));
        let pool = WorkerPool::new(2);

        let outcome = pool
            .run(
                worker(transcriber.clone()),
                segments(&["a", "b", "c", "d", "e", "f"]),
                &JobCancellation::new(),
                &*no_progress(),
            )
            .await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.fragments.len(), 6);
        assert!(transcriber.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn completion_order_differs_from_dispatch_order() {
        let transcriber = Arc::new(TrackingTranscriber::new(None));
        let pool = WorkerPool::new(3);

        let outcome = pool
            .run(
                worker(transcriber),
                segments(&["a", "b", "c"]),
                &JobCancellation::new(),
                &*no_progress(),
            )
            .await;

        let arrival: Vec<u32> = outcome.fragments.iter().map(|f| f.order).collect();
        assert_eq!(arrival, vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn failures_are_collected_with_their_order() {
        let transcriber = Arc::new(TrackingTranscriber::new(Some("b")));
        let outcome = WorkerPool::new(4)
            .run(
                worker(transcriber),
                segments(&["a", "b", "c"]),
                &JobCancellation::new(),
                &*no_progress(),
            )
            .await;

        assert_eq!(outcome.fragments.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].order, 1);
        assert!(!outcome.is_complete());
    }

    #[tokio::test]
    async fn cancelled_before_dispatch_sends_nothing() {
        let transcriber = Arc::new(TrackingTranscriber::new(None));
        let cancel = JobCancellation::new();
        cancel.cancel();
        let segs = segments(&["a", "b"]);
        let paths: Vec<_> = segs.iter().map(|s| s.audio.path().to_path_buf()).collect();

        let outcome = WorkerPool::new(2)
            .run(worker(transcriber.clone()), segs, &cancel, &*no_progress())
            .await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.dispatched, 0);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn progress_reaches_total() {
        let transcriber = Arc::new(TrackingTranscriber::new(None));
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_cb = Arc::clone(&seen);
        let progress: Box<SegmentProgress> = Box::new(move |done, total| {
            assert!(done <= total);
            seen_cb.fetch_max(done, Ordering::SeqCst);
        });

        WorkerPool::new(1)
            .run(
                worker(transcriber),
                segments(&["a", "b", "c"]),
                &JobCancellation::new(),
                &*progress,
            )
            .await;

        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
