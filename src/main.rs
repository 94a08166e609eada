//! Podscribe CLI entry point

use std::process::ExitCode;

use clap::Parser;

use podscribe::cli::{
    app::{load_merged_config, run_kinds, run_plan, run_show, run_transcribe, EXIT_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use podscribe::domain::config::{AppConfig, StorageConfig};
use podscribe::infrastructure::observability::{init_tracing, TracingConfig};
use podscribe::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Config commands operate on the file alone
    if let Commands::Config { action } = cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Build CLI config from args
    let cli_config = match &cli.command {
        Commands::Transcribe(args) => AppConfig {
            max_concurrency: args.jobs,
            storage: args.library_dir.clone().map(|dir| StorageConfig {
                library_dir: Some(dir),
                transcript_dir: None,
            }),
            ..Default::default()
        },
        _ => AppConfig::empty(),
    };

    let config = load_merged_config(cli_config).await;
    init_tracing(TracingConfig::from_config(&config, cli.verbose));

    match cli.command {
        Commands::Transcribe(args) => run_transcribe(args, config).await,
        Commands::Show { kind, id } => run_show(&kind, id, config).await,
        Commands::Plan { file, max_payload } => run_plan(&file, max_payload, config).await,
        Commands::Kinds => run_kinds(&config),
        Commands::Config { .. } => ExitCode::SUCCESS,
    }
}
