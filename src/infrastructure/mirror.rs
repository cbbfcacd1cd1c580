use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::ports::CommandRunner;
use crate::domain::types::{Invocation, MirrorEndpoint, RunStatus};
use crate::infrastructure::candidates::first_existing_file;
use crate::infrastructure::config::LauncherConfig;

const URL_PLACEHOLDER: &str = "{url}";

/// How to point a package manager at a registry and how to install.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageManager {
    pub program: PathBuf,
    pub set_registry_args: Vec<String>,
    pub install_args: Vec<String>,
}

impl PackageManager {
    pub fn pnpm(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            set_registry_args: ["config", "set", "registry", URL_PLACEHOLDER]
                .map(String::from)
                .to_vec(),
            install_args: vec!["install".to_string()],
        }
    }

    fn set_registry_args_for(&self, mirror: &MirrorEndpoint) -> Vec<String> {
        self.set_registry_args
            .iter()
            .map(|arg| arg.replace(URL_PLACEHOLDER, &mirror.url))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstallReport {
    Installed { mirror: String, attempts: usize },
    Exhausted { attempts: usize },
}

impl InstallReport {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }
}

pub struct MirrorFailoverInstaller {
    runner: Arc<dyn CommandRunner>,
    manager: PackageManager,
    working_dir: PathBuf,
    path_prefix: Option<PathBuf>,
    registry_timeout: Duration,
    install_timeout: Duration,
}

impl MirrorFailoverInstaller {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        manager: PackageManager,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            manager,
            working_dir: working_dir.into(),
            path_prefix: None,
            registry_timeout: Duration::from_secs(30),
            install_timeout: Duration::from_secs(600),
        }
    }

    pub fn with_path_prefix(mut self, dir: impl Into<PathBuf>) -> Self {
        self.path_prefix = Some(dir.into());
        self
    }

    pub fn with_timeouts(mut self, registry: Duration, install: Duration) -> Self {
        self.registry_timeout = registry;
        self.install_timeout = install;
        self
    }

    /// Installer for the web console backend's node dependencies, using the
    /// bundled node runtime. Fails when any required path is absent.
    pub fn for_web_console(
        config: &LauncherConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        let node_dir = config.node_dir();
        let backend_dir = config.module_dir("HMMLDemon");
        if !node_dir.is_dir() {
            bail!("node runtime directory missing: {}", node_dir.display());
        }
        let Some(pnpm) = first_existing_file(&[node_dir.join("pnpm.cmd"), node_dir.join("pnpm")])
        else {
            bail!("pnpm executable missing under {}", node_dir.display());
        };
        if !backend_dir.is_dir() {
            bail!("web console backend directory missing: {}", backend_dir.display());
        }

        Ok(Self::new(runner, PackageManager::pnpm(pnpm), backend_dir)
            .with_path_prefix(node_dir)
            .with_timeouts(config.registry_timeout, config.install_timeout))
    }

    /// Tries mirrors in the given order and stops at the first successful install.
    pub async fn install(&self, mirrors: &[MirrorEndpoint]) -> InstallReport {
        let total = mirrors.len();
        for (index, mirror) in mirrors.iter().enumerate() {
            let attempt = index + 1;
            tracing::info!(
                mirror = %mirror.label,
                url = %mirror.url,
                attempt,
                total,
                "trying dependency mirror"
            );
            println!("Trying mirror {} ({}) [{attempt}/{total}]", mirror.label, mirror.url);

            if !self.set_registry(mirror).await {
                continue;
            }
            if self.run_install(mirror).await {
                tracing::info!(mirror = %mirror.label, attempt, "dependencies installed");
                println!("Dependencies installed from {}", mirror.label);
                return InstallReport::Installed {
                    mirror: mirror.label.clone(),
                    attempts: attempt,
                };
            }
            println!("Install from {} failed, trying next mirror...", mirror.label);
        }

        tracing::error!(attempts = total, "every dependency mirror failed");
        InstallReport::Exhausted { attempts: total }
    }

    async fn set_registry(&self, mirror: &MirrorEndpoint) -> bool {
        let mut invocation = Invocation::new(&self.manager.program, &self.working_dir).captured();
        for arg in self.manager.set_registry_args_for(mirror) {
            invocation = invocation.arg(arg);
        }
        let invocation = self.with_prefix(invocation);

        match self.runner.run(&invocation, self.registry_timeout).await {
            Ok(RunStatus::Success) => true,
            Ok(RunStatus::Failed { code, stderr }) => {
                tracing::warn!(
                    mirror = %mirror.label,
                    code = ?code,
                    stderr = %stderr.unwrap_or_default(),
                    "failed to set registry"
                );
                false
            }
            Ok(RunStatus::TimedOut) => {
                tracing::warn!(mirror = %mirror.label, "setting registry timed out");
                false
            }
            Err(error) => {
                tracing::warn!(
                    mirror = %mirror.label,
                    error = %format!("{error:#}"),
                    "setting registry failed to run"
                );
                false
            }
        }
    }

    async fn run_install(&self, mirror: &MirrorEndpoint) -> bool {
        let mut invocation = Invocation::new(&self.manager.program, &self.working_dir);
        for arg in &self.manager.install_args {
            invocation = invocation.arg(arg);
        }
        let invocation = self.with_prefix(invocation);

        match self.runner.run(&invocation, self.install_timeout).await {
            Ok(RunStatus::Success) => true,
            Ok(RunStatus::Failed { code, .. }) => {
                tracing::warn!(mirror = %mirror.label, code = ?code, "dependency install failed");
                false
            }
            Ok(RunStatus::TimedOut) => {
                tracing::error!(
                    mirror = %mirror.label,
                    timeout_secs = self.install_timeout.as_secs(),
                    "dependency install timed out"
                );
                false
            }
            Err(error) => {
                tracing::error!(
                    mirror = %mirror.label,
                    error = %format!("{error:#}"),
                    "dependency install failed to run"
                );
                false
            }
        }
    }

    fn with_prefix(&self, invocation: Invocation) -> Invocation {
        match &self.path_prefix {
            Some(prefix) => invocation.with_path_prefix(prefix),
            None => invocation,
        }
    }
}
