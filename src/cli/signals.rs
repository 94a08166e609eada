//! Signal handling for transcription jobs

use colored::Colorize;

use crate::application::JobCancellation;

/// Cancel `cancel` on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
///
/// The listener runs on a background task for the life of the process.
pub fn cancel_on_shutdown(cancel: JobCancellation) -> Result<(), std::io::Error> {
    #[cfg(unix)]
    let mut sigterm = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate())?
    };

    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = sigterm.recv();
        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\n{} Interrupted, cancelling job", "↓".cyan());
            }
            _ = terminate => {
                eprintln!("{} Received SIGTERM, cancelling job", "↓".cyan());
            }
        }
        tracing::info!("Shutdown signal received");
        cancel.cancel();
    });

    Ok(())
}
