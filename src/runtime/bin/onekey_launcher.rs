use onekey_launcher::domain::BootstrapError;
use onekey_launcher::infrastructure::config::LauncherConfig;
use onekey_launcher::infrastructure::logging::init_logging;
use onekey_launcher::runtime::{build_sequencer, report_failure, run_until_interrupted};
use std::process::ExitCode;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match LauncherConfig::load() {
        Ok(config) => config,
        Err(error) => {
            let error = BootstrapError::from(error.context("failed to load launcher config"));
            return report_failure(&error);
        }
    };
    let logging_runtime = match init_logging(&config) {
        Ok(runtime) => runtime,
        Err(error) => return report_failure(&BootstrapError::from(error)),
    };
    info!(
        root = %config.root_dir.display(),
        launch_dir = %config.launch_dir.display(),
        log_file = %logging_runtime.log_file.display(),
        log_level = %config.log_level,
        retention_days = config.log_retention_days,
        handoff = config.handoff.as_deref().unwrap_or("main-start script"),
        "onekey launcher starting"
    );

    let sequencer = build_sequencer(config);
    let code = run_until_interrupted(sequencer).await;

    drop(logging_runtime);
    code
}
