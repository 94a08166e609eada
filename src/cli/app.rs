//! Command runners and composition root

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::application::ports::{AudioSlicer, ConfigStore, TranscriptStore};
use crate::application::{
    plan_ranges, ChunkingTranscriber, JobCallbacks, JobCancellation, JobError, JobRequest,
    RetryPolicy, Segmenter, TranscribableRegistry, TranscriptionWorker, WorkerPool,
};
use crate::domain::audio::{AudioFormat, AudioResource};
use crate::domain::config::{AppConfig, StorageConfig};
use crate::domain::transcription::{EntityKind, OwnerRef};
use crate::domain::units::ByteSize;
use crate::infrastructure::{
    FfmpegEncoder, FileTranscriptStore, GeminiTranscriber, LibraryResolver, XdgConfigStore,
};

use super::args::TranscribeArgs;
use super::presenter::Presenter;
use super::signals::cancel_on_shutdown;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;
pub const EXIT_CANCELLED: u8 = 130;

/// Root for library and transcripts when no directory is configured
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("podscribe")
}

pub fn library_dir(config: &AppConfig) -> PathBuf {
    config
        .library_dir()
        .map(PathBuf::from)
        .unwrap_or_else(|| default_data_dir().join("library"))
}

pub fn transcript_dir(config: &AppConfig) -> PathBuf {
    config
        .transcript_dir()
        .map(PathBuf::from)
        .unwrap_or_else(|| default_data_dir().join("transcripts"))
}

/// Register every transcribable kind against the library and store
pub fn build_registry(
    config: &AppConfig,
    store: Arc<dyn TranscriptStore>,
) -> TranscribableRegistry {
    let library = library_dir(config);
    let max_payload = config.max_payload_or_default();

    [EntityKind::podcast_segment(), EntityKind::attachment()]
        .into_iter()
        .fold(TranscribableRegistry::new(), |registry, kind| {
            let resolver =
                LibraryResolver::new(&library, kind.clone(), max_payload, Arc::clone(&store));
            registry.with(kind, Arc::new(resolver))
        })
}

/// Wire adapters into the chunking transcriber
pub fn build_transcriber(
    config: &AppConfig,
    api_key: String,
    registry: TranscribableRegistry,
) -> ChunkingTranscriber {
    let encoder = Arc::new(FfmpegEncoder::from_config(config));

    let mut backend = GeminiTranscriber::new(api_key).with_model(config.model_or_default());
    if let Some(ref url) = config.api_base_url {
        backend = backend.with_base_url(url);
    }

    let policy = RetryPolicy {
        max_attempts: config.max_attempts_or_default(),
        base_backoff: config.backoff_or_default(),
        max_backoff: config.max_backoff_or_default(),
        call_timeout: config.call_timeout_or_default(),
    };

    ChunkingTranscriber::new(
        registry,
        encoder.clone(),
        Segmenter::new(encoder).with_min_segment(config.min_segment_or_default()),
        TranscriptionWorker::new(Arc::new(backend), policy),
        WorkerPool::new(config.max_concurrency_or_default()),
    )
}

/// Run `podscribe transcribe`
pub async fn run_transcribe(args: TranscribeArgs, config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    let max_payload = match args.max_payload.as_deref().map(str::parse::<ByteSize>) {
        Some(Ok(size)) => Some(size),
        Some(Err(e)) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        None => None,
    };

    let store: Arc<dyn TranscriptStore> = Arc::new(FileTranscriptStore::new(transcript_dir(&config)));
    let registry = build_registry(&config, Arc::clone(&store));
    if !registry.is_registered(&args.kind) {
        presenter.error(&format!(
            "Unknown kind \"{}\". Registered kinds: {}",
            args.kind,
            registered_kinds(&registry)
        ));
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let api_key = match get_api_key(&config) {
        Ok(key) => key,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let cancel = JobCancellation::new();
    if let Err(e) = cancel_on_shutdown(cancel.clone()) {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let transcriber = build_transcriber(&config, api_key, registry);
    let request = JobRequest {
        max_payload,
        save: !args.no_save,
        ..JobRequest::new(args.kind.clone(), args.id)
    };

    let view = presenter.job_progress(&format!("{}#{}", args.kind, args.id));
    let callbacks = {
        let (on_state, on_planned, on_done) = (view.clone(), view.clone(), view.clone());
        JobCallbacks {
            on_state: Some(Box::new(move |state| on_state.on_state(state))),
            on_segments_planned: Some(Box::new(move |n| on_planned.on_segments_planned(n))),
            on_segment_done: Some(Box::new(move |done, total| {
                on_done.on_segment_done(done, total)
            })),
        }
    };

    match transcriber.run(&request, &callbacks, &cancel).await {
        Ok(output) => {
            view.finish_success(&format!(
                "Transcribed {} segment(s), {} words ({})",
                output.transcript.source_segment_count,
                output.transcript.word_count(),
                ByteSize::human(output.audio_bytes)
            ));
            presenter.output(&output.transcript.text);
            if output.saved {
                let path = FileTranscriptStore::new(transcript_dir(&config))
                    .path_for(&output.transcript.owner);
                presenter.info(&format!("Stored transcript at {}", path.display()));
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            view.finish_fail("Transcription failed");
            report_job_error(&presenter, &e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Run `podscribe show`
pub async fn run_show(kind: &str, id: u64, config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    let kind = match kind.parse::<EntityKind>() {
        Ok(kind) => kind,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };
    let owner = OwnerRef::new(kind, id);
    let store = FileTranscriptStore::new(transcript_dir(&config));

    match store.load(&owner).await {
        Ok(Some(transcript)) => {
            presenter.info(&format!(
                "{} · {} segment(s) · {}",
                owner,
                transcript.source_segment_count,
                transcript.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
            presenter.output(&transcript.text);
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(None) => {
            presenter.error(&format!("No transcript stored for {}", owner));
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run `podscribe plan`
pub async fn run_plan(file: &Path, max_payload: Option<String>, config: AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();

    let max_payload = match max_payload {
        Some(s) => match s.parse::<ByteSize>() {
            Ok(size) => size,
            Err(e) => {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        None => config.max_payload_or_default(),
    };

    let size = match tokio::fs::metadata(file).await {
        Ok(meta) => meta.len(),
        Err(e) => {
            presenter.error(&format!("Cannot read {}: {}", file.display(), e));
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let format = AudioFormat::from_path(file).unwrap_or_default();
    let audio = AudioResource::from_file(file, size, format);

    presenter.start_spinner("Probing duration...");
    let slicer = FfmpegEncoder::from_config(&config);
    let total_ms = match slicer.probe_duration_ms(&audio).await {
        Ok(ms) => {
            presenter.spinner_success(&format!(
                "{} · {} · {} ms",
                file.display(),
                ByteSize::human(size),
                ms
            ));
            ms
        }
        Err(e) => {
            presenter.spinner_fail(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let ranges = match plan_ranges(total_ms, size, max_payload) {
        Ok(ranges) => ranges,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    if format != AudioFormat::Ogg {
        presenter.warn("Source will be re-encoded to Ogg/Opus first; the real plan uses the encoded size");
    }
    presenter.info(&format!(
        "{} segment(s) under a {} cap",
        ranges.len(),
        max_payload
    ));
    for (order, range) in ranges.iter().enumerate() {
        let estimated = size.saturating_mul(range.len_ms()) / total_ms;
        presenter.output(&presenter.format_plan_row(order, *range, estimated));
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Run `podscribe kinds`
pub fn run_kinds(config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let store: Arc<dyn TranscriptStore> = Arc::new(FileTranscriptStore::new(transcript_dir(config)));
    let registry = build_registry(config, store);
    let library = library_dir(config);

    for kind in registry.kinds() {
        presenter.key_value(kind.as_str(), &library.join(kind.as_str()).to_string_lossy());
    }
    ExitCode::from(EXIT_SUCCESS)
}

fn registered_kinds(registry: &TranscribableRegistry) -> String {
    registry
        .kinds()
        .map(EntityKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn report_job_error(presenter: &Presenter, error: &JobError) {
    presenter.error(&error.to_string());
    if let JobError::PartialTranscription(partial) = error {
        for failure in &partial.failures {
            presenter.warn(&format!(
                "segment {}: {} (after {} attempt(s){})",
                failure.order,
                failure.cause,
                failure.attempts,
                if failure.retries_exhausted {
                    ", retries exhausted"
                } else {
                    ""
                }
            ));
        }
        presenter.info(&format!(
            "{} of {} segment(s) completed; nothing was stored",
            partial.completed.len(),
            partial.total_segments
        ));
    }
}

/// Map a job error onto the process exit code
pub fn exit_code_for(error: &JobError) -> u8 {
    if error.is_cancelled() {
        EXIT_CANCELLED
    } else if error.is_invalid_request() {
        EXIT_USAGE_ERROR
    } else {
        EXIT_ERROR
    }
}

/// Get API key from merged configuration
pub fn get_api_key(config: &AppConfig) -> Result<String, String> {
    config
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            "Missing API key. Set GEMINI_API_KEY environment variable or run 'podscribe config set api_key <key>'".to_string()
        })
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.is_empty())
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not installed yet, so report directly
            Presenter::new().warn(&format!(
                "Ignoring config file {}: {}",
                store.path().display(),
                e
            ));
            AppConfig::empty()
        }
    };

    // Build env config
    let library_dir = env_var("PODSCRIBE_LIBRARY_DIR");
    let transcript_dir = env_var("PODSCRIBE_TRANSCRIPT_DIR");
    let env_config = AppConfig {
        api_key: env_var("GEMINI_API_KEY"),
        api_base_url: env_var("GEMINI_API_BASE_URL"),
        storage: (library_dir.is_some() || transcript_dir.is_some()).then(|| StorageConfig {
            library_dir,
            transcript_dir,
        }),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::PartialTranscriptionError;
    use crate::domain::error::InvalidInputError;
    use crate::domain::transcription::JobState;

    fn owner() -> OwnerRef {
        OwnerRef::new(EntityKind::attachment(), 1)
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let cancelled = JobError::Cancelled {
            owner: owner(),
            phase: JobState::Dispatching,
        };
        let invalid = JobError::InvalidInput {
            owner: owner(),
            source: InvalidInputError::new("empty"),
        };
        let partial = JobError::PartialTranscription(PartialTranscriptionError {
            owner: owner(),
            failures: vec![],
            completed: vec![],
            total_segments: 2,
        });

        assert_eq!(exit_code_for(&cancelled), EXIT_CANCELLED);
        assert_eq!(exit_code_for(&invalid), EXIT_USAGE_ERROR);
        assert_eq!(exit_code_for(&partial), EXIT_ERROR);
    }

    #[test]
    fn registry_knows_both_kinds() {
        let config = AppConfig::defaults();
        let store: Arc<dyn TranscriptStore> = Arc::new(FileTranscriptStore::new("/tmp/unused"));
        let registry = build_registry(&config, store);

        assert_eq!(registered_kinds(&registry), "attachment, podcast_segment");
    }

    #[test]
    fn configured_directories_win_over_defaults() {
        let config = AppConfig {
            storage: Some(StorageConfig {
                library_dir: Some("/srv/lib".to_string()),
                transcript_dir: None,
            }),
            ..Default::default()
        };
        assert_eq!(library_dir(&config), PathBuf::from("/srv/lib"));
        assert!(transcript_dir(&config).ends_with("podscribe/transcripts"));
    }

    #[test]
    fn api_key_must_be_non_empty() {
        let mut config = AppConfig::empty();
        assert!(get_api_key(&config).is_err());
        config.api_key = Some(String::new());
        assert!(get_api_key(&config).is_err());
        config.api_key = Some("k".to_string());
        assert_eq!(get_api_key(&config).unwrap(), "k");
    }
}
