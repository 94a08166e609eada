//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Podscribe - chunked transcription of long-form audio
#[derive(Parser, Debug)]
#[command(name = "podscribe")]
#[command(version)]
#[command(about = "Transcribe podcast segments and attachments in payload-sized chunks")]
#[command(long_about = None)]
pub struct Cli {
    /// Verbose logging (debug level for podscribe)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe an entity's audio and store the transcript
    Transcribe(TranscribeArgs),

    /// Print the stored transcript of an entity
    Show {
        /// Entity kind (see `podscribe kinds`)
        kind: String,
        /// Entity id
        id: u64,
    },

    /// Show how a local audio file would be segmented
    Plan {
        /// Audio file to inspect
        file: PathBuf,
        /// Payload cap per backend call (e.g., 10MiB, 512KiB)
        #[arg(long, value_name = "SIZE")]
        max_payload: Option<String>,
    },

    /// List registered entity kinds
    Kinds,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `podscribe transcribe`
#[derive(clap::Args, Debug, Clone)]
pub struct TranscribeArgs {
    /// Entity kind (e.g., podcast_segment, attachment)
    pub kind: String,

    /// Entity id
    pub id: u64,

    /// Maximum concurrent backend calls
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Payload cap per backend call (e.g., 10MiB, 512KiB)
    #[arg(long, value_name = "SIZE")]
    pub max_payload: Option<String>,

    /// Print the transcript without storing it
    #[arg(long)]
    pub no_save: bool,

    /// Directory holding entity audio, as <dir>/<kind>/<id>.<ext>
    #[arg(long, value_name = "DIR")]
    pub library_dir: Option<String>,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "api_key",
    "model",
    "api_base_url",
    "max_payload",
    "max_concurrency",
    "max_attempts",
    "call_timeout",
    "backoff",
    "max_backoff",
    "min_segment",
    "log_format",
    "encoder.bitrate_kbps",
    "encoder.ffmpeg",
    "encoder.ffprobe",
    "encoder.timeout",
    "storage.library_dir",
    "storage.transcript_dir",
];

/// Valid `log_format` values
pub const VALID_LOG_FORMATS: &[&str] = &["pretty", "json"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_transcribe_defaults() {
        let cli = Cli::parse_from(["podscribe", "transcribe", "podcast_segment", "42"]);
        assert!(!cli.verbose);
        match cli.command {
            Commands::Transcribe(args) => {
                assert_eq!(args.kind, "podcast_segment");
                assert_eq!(args.id, 42);
                assert!(args.jobs.is_none());
                assert!(args.max_payload.is_none());
                assert!(!args.no_save);
            }
            other => panic!("Expected Transcribe, got {:?}", other),
        }
    }

    #[test]
    fn cli_parses_transcribe_flags() {
        let cli = Cli::parse_from([
            "podscribe",
            "-v",
            "transcribe",
            "attachment",
            "7",
            "-j",
            "2",
            "--max-payload",
            "5MiB",
            "--no-save",
        ]);
        assert!(cli.verbose);
        let Commands::Transcribe(args) = cli.command else {
            panic!("Expected Transcribe");
        };
        assert_eq!(args.jobs, Some(2));
        assert_eq!(args.max_payload, Some("5MiB".to_string()));
        assert!(args.no_save);
    }

    #[test]
    fn cli_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["podscribe", "transcribe", "attachment", "abc"]).is_err());
    }

    #[test]
    fn cli_parses_plan() {
        let cli = Cli::parse_from(["podscribe", "plan", "episode.mp3", "--max-payload", "1MiB"]);
        match cli.command {
            Commands::Plan { file, max_payload } => {
                assert_eq!(file, PathBuf::from("episode.mp3"));
                assert_eq!(max_payload, Some("1MiB".to_string()));
            }
            other => panic!("Expected Plan, got {:?}", other),
        }
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["podscribe", "config", "set", "max_payload", "20MiB"]);
        if let Commands::Config {
            action: ConfigAction::Set { key, value },
        } = cli.command
        {
            assert_eq!(key, "max_payload");
            assert_eq!(value, "20MiB");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("api_key"));
        assert!(is_valid_config_key("encoder.bitrate_kbps"));
        assert!(is_valid_config_key("storage.transcript_dir"));
        assert!(!is_valid_config_key("duration"));
    }

    #[test]
    fn verify_cli() {
        // Verify the CLI definition is valid
        Cli::command().debug_assert();
    }
}
