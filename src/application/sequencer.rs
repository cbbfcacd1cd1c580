use std::sync::Arc;
use std::time::Duration;

use crate::application::commands::CommandTable;
use crate::application::services::ServiceSet;
use crate::domain::error::{BootstrapError, ErrorCode};
use crate::domain::ports::{CommandRunner, ProcessLauncher};
use crate::domain::types::{all_launched, GateState, Invocation, RunStatus};
use crate::infrastructure::config::LauncherConfig;
use crate::infrastructure::first_run::FirstRunGate;
use crate::infrastructure::interpreter::find_python;
use crate::infrastructure::materializer::{bundle_config_specs, materialize, MaterializeReport};
use crate::infrastructure::mirror::{InstallReport, MirrorFailoverInstaller};
use crate::infrastructure::path_guard::{check_path_legal, remediation_hint};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPath {
    FirstRun,
    SteadyState,
}

#[derive(Clone, Debug)]
pub struct BootstrapOutcome {
    pub path: RunPath,
    pub configs: Option<MaterializeReport>,
    pub dependencies: Option<InstallReport>,
    pub web_console_launched: Option<bool>,
}

impl BootstrapOutcome {
    fn steady_state() -> Self {
        Self {
            path: RunPath::SteadyState,
            configs: None,
            dependencies: None,
            web_console_launched: None,
        }
    }
}

/// Entry point of a launcher run: path check, first-run gate, then either the
/// one-time bootstrap or the steady-state handoff.
pub struct BootstrapSequencer {
    config: LauncherConfig,
    runner: Arc<dyn CommandRunner>,
    services: ServiceSet,
    commands: CommandTable,
}

impl BootstrapSequencer {
    pub fn new(
        config: LauncherConfig,
        runner: Arc<dyn CommandRunner>,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> Self {
        let services = ServiceSet::new(config.clone(), launcher);
        Self {
            config,
            runner,
            services,
            commands: CommandTable::with_defaults(),
        }
    }

    pub fn with_commands(mut self, commands: CommandTable) -> Self {
        self.commands = commands;
        self
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub async fn run(&self) -> Result<BootstrapOutcome, BootstrapError> {
        self.check_location()?;

        let gate = FirstRunGate::from_config(&self.config);
        match gate.query() {
            GateState::Completed => {
                tracing::info!("bundle already initialized, starting services");
                println!("Bundle already initialized, starting MaiBot...");
                self.handoff().await?;
                Ok(BootstrapOutcome::steady_state())
            }
            GateState::NotYetRun => match self.first_run(&gate).await {
                Ok(outcome) => Ok(outcome),
                Err(error) => {
                    if error.code() == ErrorCode::CriticalStep {
                        if let Err(release_error) = gate.release_claim() {
                            tracing::error!(
                                error = %format!("{release_error:#}"),
                                "could not release first-run marker; delete it manually to retry setup"
                            );
                        }
                    }
                    Err(error)
                }
            },
        }
    }

    fn check_location(&self) -> Result<(), BootstrapError> {
        let mut locations = vec![&self.config.root_dir];
        if self.config.launch_dir != self.config.root_dir {
            locations.push(&self.config.launch_dir);
        }
        for location in locations {
            if let Err(illegal) = check_path_legal(location) {
                println!("{illegal}");
                println!("{}", remediation_hint());
                tracing::error!(
                    path = %illegal.path.display(),
                    "bundle path contains unsupported characters"
                );
                return Err(BootstrapError::illegal_path(illegal.to_string()));
            }
        }
        tracing::info!(root = %self.config.root_dir.display(), "bundle path check passed");
        Ok(())
    }

    async fn first_run(&self, gate: &FirstRunGate) -> Result<BootstrapOutcome, BootstrapError> {
        tracing::info!("first run, initializing bundle");
        println!("First run detected, initializing the bundle...");

        let configs = materialize(&bundle_config_specs(&self.config));

        self.run_script(&self.config.update_script, self.config.script_timeout, |message| {
            BootstrapError::critical_step(message)
        })
        .await?;

        let dependencies = self.install_web_dependencies().await;
        if !dependencies.as_ref().is_some_and(InstallReport::succeeded) {
            tracing::warn!("web console dependencies not installed; continuing");
            println!(
                "Warning: web console dependencies failed to install, the web console may be unavailable."
            );
        }

        self.run_script(&self.config.gateway_init_script, self.config.script_timeout, |message| {
            BootstrapError::critical_step(message)
        })
        .await?;

        println!("Starting the web console for first-time setup.");
        println!("If no browser opens, visit {}", self.config.console_url);
        let web_console_launched = match self.services.launch_web_console().await {
            Ok(results) => all_launched(&results),
            Err(error) => {
                tracing::warn!(error = %error, "web console not started");
                false
            }
        };
        if !web_console_launched {
            tracing::warn!("web console launch failed during first run");
            println!("The web console failed to start; it can be started later.");
        }

        if let Err(error) = gate.mark_complete() {
            tracing::warn!(error = %format!("{error:#}"), "could not write completion marker");
        }

        self.handoff().await?;

        Ok(BootstrapOutcome {
            path: RunPath::FirstRun,
            configs: Some(configs),
            dependencies,
            web_console_launched: Some(web_console_launched),
        })
    }

    async fn install_web_dependencies(&self) -> Option<InstallReport> {
        let prepared = MirrorFailoverInstaller::for_web_console(&self.config, self.runner.clone());
        let installer = match prepared {
            Ok(installer) => installer,
            Err(error) => {
                tracing::warn!(
                    error = %format!("{error:#}"),
                    "web console dependency install skipped"
                );
                return None;
            }
        };
        println!("Installing web console dependencies...");
        Some(installer.install(&self.config.mirrors).await)
    }

    async fn handoff(&self) -> Result<(), BootstrapError> {
        let Some(key) = self.config.handoff.as_deref() else {
            return self
                .run_script(
                    &self.config.main_start_script,
                    self.config.main_start_timeout,
                    |message| BootstrapError::handoff_failed(message),
                )
                .await;
        };
        let entry = self
            .commands
            .resolve(key)
            .ok_or_else(|| {
                BootstrapError::handoff_failed(format!("unknown handoff command: {key}"))
            })?;

        tracing::info!(
            command = %entry.key,
            description = %entry.description,
            "dispatching handoff command"
        );
        let results = self.services.dispatch(&entry.action).await;
        if all_launched(&results) {
            tracing::info!(command = %entry.key, "all services started");
            Ok(())
        } else {
            let failed = results
                .iter()
                .filter(|result| !result.ok)
                .map(|result| result.label.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Err(BootstrapError::handoff_failed(format!(
                "services failed to start: {failed}"
            )))
        }
    }

    async fn run_script(
        &self,
        name: &str,
        timeout: Duration,
        fail: fn(String) -> BootstrapError,
    ) -> Result<(), BootstrapError> {
        let script = self.config.root_dir.join(name);
        if !script.is_file() {
            tracing::error!(script = %script.display(), "script not found");
            return Err(fail(format!("script not found: {}", script.display())));
        }
        let Some(python) = find_python(&self.config) else {
            tracing::error!(script = name, "no python interpreter found");
            return Err(fail(format!("no python interpreter found to run {name}")));
        };

        tracing::info!(script = name, python = %python.display(), "running script");
        let invocation = Invocation::new(python, &self.config.root_dir).arg(script.as_os_str());
        match self.runner.run(&invocation, timeout).await {
            Ok(RunStatus::Success) => {
                tracing::info!(script = name, "script finished");
                Ok(())
            }
            Ok(RunStatus::Failed { code, .. }) => {
                tracing::error!(script = name, code = ?code, "script failed");
                Err(fail(format!("{name} exited with status {code:?}")))
            }
            Ok(RunStatus::TimedOut) => {
                tracing::error!(
                    script = name,
                    timeout = ?timeout,
                    "script timed out"
                );
                Err(fail(format!("{name} timed out")))
            }
            Err(error) => {
                tracing::error!(
                    script = name,
                    error = %format!("{error:#}"),
                    "script failed to start"
                );
                Err(fail(format!("{name} failed to start: {error:#}")))
            }
        }
    }
}
