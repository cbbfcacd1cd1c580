use std::process::ExitCode;
use std::sync::Arc;

use tokio::task::JoinError;

use crate::application::sequencer::{BootstrapOutcome, BootstrapSequencer, RunPath};
use crate::domain::error::BootstrapError;
use crate::infrastructure::config::LauncherConfig;
use crate::infrastructure::process::{DetachedLauncher, TokioCommandRunner};

pub fn build_sequencer(config: LauncherConfig) -> BootstrapSequencer {
    BootstrapSequencer::new(config, Arc::new(TokioCommandRunner), Arc::new(DetachedLauncher))
}

/// Runs the sequencer until it finishes or the operator interrupts it.
///
/// The run happens on its own task so a panic surfaces as an internal error
/// with the regular failure exit code.
pub async fn run_until_interrupted(sequencer: BootstrapSequencer) -> ExitCode {
    let mut run = tokio::spawn(async move { sequencer.run().await });
    tokio::select! {
        joined = &mut run => exit_code_for(flatten_join(joined)),
        _ = interrupt_signal() => {
            run.abort();
            tracing::info!("interrupted by operator");
            println!("\nInterrupted, exiting.");
            ExitCode::SUCCESS
        }
    }
}

fn flatten_join(
    joined: Result<Result<BootstrapOutcome, BootstrapError>, JoinError>,
) -> Result<BootstrapOutcome, BootstrapError> {
    joined.unwrap_or_else(|error| {
        Err(BootstrapError::internal(format!("launcher task failed: {error}")))
    })
}

pub fn exit_code_for(result: Result<BootstrapOutcome, BootstrapError>) -> ExitCode {
    match result {
        Ok(outcome) => {
            let path = match outcome.path {
                RunPath::FirstRun => "first_run",
                RunPath::SteadyState => "steady_state",
            };
            tracing::info!(path, "launcher finished");
            ExitCode::SUCCESS
        }
        Err(error) => report_failure(&error),
    }
}

/// Logs and prints a fatal error, returning its exit code.
pub fn report_failure(error: &BootstrapError) -> ExitCode {
    tracing::error!(code = error.code_str(), error = %error.message(), "launcher failed");
    eprintln!("Launcher failed: {}", error.message());
    ExitCode::from(error.exit_code())
}

pub async fn interrupt_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
