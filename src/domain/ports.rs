use crate::domain::types::{Invocation, LaunchCommand, LaunchResult, RunStatus};
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Runs an external program to completion, bounded by `timeout`.
///
/// A non-zero exit or an elapsed timeout is reported through [`RunStatus`];
/// `Err` is reserved for failures to start the program at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation, timeout: Duration) -> Result<RunStatus>;
}

/// Starts a long-running service in its own execution context and returns
/// without waiting for it.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, working_dir: &Path, command: &LaunchCommand, label: &str) -> LaunchResult;

    /// Opens `url` in the operator's default browser without waiting for it.
    fn open_url(&self, url: &str, label: &str) -> LaunchResult;
}
