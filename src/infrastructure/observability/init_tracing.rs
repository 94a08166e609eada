use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::domain::config::AppConfig;

const DEFAULT_FILTER: &str = "warn,podscribe=info";
const VERBOSE_FILTER: &str = "info,podscribe=debug";

/// Configuration for tracing initialization.
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    pub json_format: bool,
    /// Raise the default filter to debug for this crate
    pub verbose: bool,
}

impl TracingConfig {
    pub fn from_config(config: &AppConfig, verbose: bool) -> Self {
        Self {
            json_format: config.json_logs(),
            verbose,
        }
    }

    /// `RUST_LOG` wins over the built-in defaults.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if self.verbose {
                VERBOSE_FILTER
            } else {
                DEFAULT_FILTER
            })
        })
    }
}

/// Initialize the tracing subscriber. Logs go to stderr so stdout stays
/// reserved for transcript text. Safe to call more than once.
pub fn init_tracing(config: TracingConfig) {
    let env_filter = config.env_filter();

    let result = if config.json_format {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!(
            json_format = config.json_format,
            verbose = config.verbose,
            "Tracing initialized"
        );
    }
}
