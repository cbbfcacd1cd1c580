use anyhow::{Context, Result};
use async_trait::async_trait;
use std::env;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::domain::ports::{CommandRunner, ProcessLauncher};
use crate::domain::types::{Invocation, LaunchCommand, LaunchResult, RunStatus};

const SERVICE_LABEL_ENV: &str = "ONEKEY_SERVICE_LABEL";
#[cfg(windows)]
const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

/// Blocking child-process runner. Console I/O is inherited unless the
/// invocation asks for capture, in which case only stderr is kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, invocation: &Invocation, timeout: Duration) -> Result<RunStatus> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.working_dir);
        if let Some(prefix) = &invocation.path_prefix {
            command.env("PATH", prepend_to_path(prefix)?);
        }
        if invocation.capture_output {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped());
        }

        tracing::debug!(
            command = %invocation.display(),
            cwd = %invocation.working_dir.display(),
            timeout_secs = timeout.as_secs(),
            "running external command"
        );
        let mut child = command
            .spawn()
            .with_context(|| format!("failed to start {}", invocation.program.display()))?;

        let stderr_reader = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buffer = String::new();
                let _ = stderr.read_to_string(&mut buffer).await;
                buffer
            })
        });

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(RunStatus::Success),
            Ok(Ok(status)) => {
                let stderr = match stderr_reader {
                    Some(reader) => reader
                        .await
                        .ok()
                        .map(|text| text.trim().to_string())
                        .filter(|text| !text.is_empty()),
                    None => None,
                };
                Ok(RunStatus::Failed {
                    code: status.code(),
                    stderr,
                })
            }
            Ok(Err(error)) => Err(error)
                .with_context(|| format!("failed waiting for {}", invocation.program.display())),
            Err(_) => {
                if let Err(error) = child.kill().await {
                    tracing::warn!(
                        command = %invocation.display(),
                        error = %error,
                        "failed to kill timed out command"
                    );
                }
                Ok(RunStatus::TimedOut)
            }
        }
    }
}

fn prepend_to_path(prefix: &Path) -> Result<OsString> {
    let mut paths = vec![prefix.to_path_buf()];
    if let Some(existing) = env::var_os("PATH") {
        paths.extend(env::split_paths(&existing));
    }
    env::join_paths(paths).context("failed to build PATH")
}

/// Starts services in their own console (Windows) or process group (unix) so
/// they outlive the launcher and do not receive its Ctrl+C.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedLauncher;

impl ProcessLauncher for DetachedLauncher {
    fn launch(&self, working_dir: &Path, command: &LaunchCommand, label: &str) -> LaunchResult {
        if !working_dir.is_dir() {
            tracing::error!(
                service = %label,
                cwd = %working_dir.display(),
                "working directory does not exist; service not started"
            );
            return LaunchResult::failure(label);
        }

        let mut process = detached_command(working_dir, command, label);
        match process.spawn() {
            Ok(child) => {
                tracing::info!(
                    service = %label,
                    pid = child.id(),
                    command = %command.display(),
                    cwd = %working_dir.display(),
                    "service launched"
                );
                LaunchResult::success(label)
            }
            Err(error) => {
                tracing::error!(
                    service = %label,
                    command = %command.display(),
                    error = %error,
                    "failed to launch service"
                );
                LaunchResult::failure(label)
            }
        }
    }

    fn open_url(&self, url: &str, label: &str) -> LaunchResult {
        match open::that_detached(url) {
            Ok(()) => {
                tracing::info!(page = %label, url, "opened browser");
                LaunchResult::success(label)
            }
            Err(error) => {
                tracing::warn!(page = %label, url, error = %error, "could not open browser");
                LaunchResult::failure(label)
            }
        }
    }
}

#[cfg(windows)]
fn detached_command(
    working_dir: &Path,
    command: &LaunchCommand,
    label: &str,
) -> std::process::Command {
    use std::os::windows::process::CommandExt;

    let mut line = format!("\"{}\"", command.program.display());
    for arg in &command.args {
        line.push_str(&format!(" \"{}\"", arg.to_string_lossy()));
    }
    let mut process = std::process::Command::new("cmd");
    process
        .raw_arg(format!("/K \"title {label} && {line}\""))
        .current_dir(working_dir)
        .env(SERVICE_LABEL_ENV, label)
        .creation_flags(CREATE_NEW_CONSOLE);
    process
}

#[cfg(unix)]
fn detached_command(
    working_dir: &Path,
    command: &LaunchCommand,
    label: &str,
) -> std::process::Command {
    use std::os::unix::process::CommandExt;

    let mut process = std::process::Command::new(&command.program);
    process
        .args(&command.args)
        .current_dir(working_dir)
        .env(SERVICE_LABEL_ENV, label)
        .stdin(Stdio::null())
        .process_group(0);
    process
}

#[cfg(not(any(unix, windows)))]
fn detached_command(
    working_dir: &Path,
    command: &LaunchCommand,
    label: &str,
) -> std::process::Command {
    let mut process = std::process::Command::new(&command.program);
    process
        .args(&command.args)
        .current_dir(working_dir)
        .env(SERVICE_LABEL_ENV, label);
    process
}
