use std::path::PathBuf;
use std::sync::Arc;

use crate::application::commands::{Action, BuiltinAction};
use crate::domain::ports::ProcessLauncher;
use crate::domain::types::{LaunchCommand, LaunchResult};
use crate::infrastructure::bot_config::read_bot_account;
use crate::infrastructure::config::LauncherConfig;
use crate::infrastructure::interpreter::find_python;
use crate::infrastructure::locator::{LocateError, ServiceLocator};

const GATEWAY_LABEL: &str = "NapCat";
const ADAPTER_LABEL: &str = "MaiBot-Napcat-Adapter";
const CORE_LABEL: &str = "MaiBot";
const CONSOLE_FRONTEND_LABEL: &str = "WebUI frontend";
const CONSOLE_BACKEND_LABEL: &str = "WebUI backend";
const CONSOLE_PAGE_LABEL: &str = "WebUI page";
const GATEWAY_LOGIN_LABEL: &str = "NapCat login page";
const GATEWAY_EXE: &str = "NapCatWinBootMain.exe";

/// The bundle's long-running services and how to start each one.
#[derive(Clone)]
pub struct ServiceSet {
    config: LauncherConfig,
    launcher: Arc<dyn ProcessLauncher>,
}

impl ServiceSet {
    pub fn new(config: LauncherConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self { config, launcher }
    }

    /// Launches gateway, adapter and core. Every service is attempted even if
    /// an earlier one failed.
    pub fn launch_all(&self) -> Vec<LaunchResult> {
        let account = match read_bot_account(&self.config) {
            Ok(account) => Some(account),
            Err(error) => {
                tracing::error!(
                    error = %format!("{error:#}"),
                    "bot account unavailable; set bot.qq_account first"
                );
                None
            }
        };
        vec![
            self.launch_gateway(account.as_deref()),
            self.launch_adapter(),
            self.launch_core(),
        ]
    }

    pub fn launch_gateway(&self, account: Option<&str>) -> LaunchResult {
        let Some(account) = account else {
            tracing::error!(service = GATEWAY_LABEL, "no bot account configured");
            return LaunchResult::failure(GATEWAY_LABEL);
        };
        let (dir, mode) = if self.config.napcat_headed {
            (self.config.module_dir("napcatframework"), "headed")
        } else {
            (self.config.module_dir("napcat"), "headless")
        };
        let exe = dir.join(GATEWAY_EXE);
        if !exe.is_file() {
            tracing::error!(
                service = GATEWAY_LABEL,
                path = %exe.display(),
                "gateway executable not found"
            );
            return LaunchResult::failure(GATEWAY_LABEL);
        }
        tracing::info!(service = GATEWAY_LABEL, mode, account, "starting gateway");
        let result = self
            .launcher
            .launch(&dir, &LaunchCommand::new(exe).arg(account), GATEWAY_LABEL);
        if result.ok {
            self.open_page(&self.config.napcat_login_url, GATEWAY_LOGIN_LABEL);
        }
        result
    }

    pub fn launch_adapter(&self) -> LaunchResult {
        self.launch_python_module("MaiBot-Napcat-Adapter", "main.py", ADAPTER_LABEL)
    }

    pub fn launch_core(&self) -> LaunchResult {
        self.launch_python_module("MaiBot", "bot.py", CORE_LABEL)
    }

    /// Starts the web console frontend, opens the console page, waits the settle
    /// delay, then starts the backend. Nothing after the frontend is attempted
    /// when the frontend failed. A browser that fails to open is not a failure.
    pub async fn launch_web_console(&self) -> Result<Vec<LaunchResult>, LocateError> {
        let layout = ServiceLocator::for_bundle(&self.config).locate()?;
        tracing::info!(generation = %layout.generation, "web console layout selected");

        let front = self.launcher.launch(
            &layout.frontend.working_directory,
            &layout.frontend.launch_command(),
            CONSOLE_FRONTEND_LABEL,
        );
        if !front.ok {
            return Ok(vec![front]);
        }
        self.open_page(&self.config.console_url, CONSOLE_PAGE_LABEL);

        if !self.config.settle_delay.is_zero() {
            tracing::debug!(delay = ?self.config.settle_delay, "waiting for frontend to settle");
            tokio::time::sleep(self.config.settle_delay).await;
        }

        let back = self.launcher.launch(
            &layout.backend.working_directory,
            &layout.backend.launch_command(),
            CONSOLE_BACKEND_LABEL,
        );
        Ok(vec![front, back])
    }

    pub async fn dispatch(&self, action: &Action) -> Vec<LaunchResult> {
        match action {
            Action::Builtin(BuiltinAction::LaunchAll) => self.launch_all(),
            Action::Builtin(BuiltinAction::LaunchGateway) => {
                let account = read_bot_account(&self.config)
                    .map_err(|error| {
                        tracing::error!(error = %format!("{error:#}"), "bot account unavailable");
                    })
                    .ok();
                vec![self.launch_gateway(account.as_deref())]
            }
            Action::Builtin(BuiltinAction::LaunchAdapter) => vec![self.launch_adapter()],
            Action::Builtin(BuiltinAction::LaunchCore) => vec![self.launch_core()],
            Action::Builtin(BuiltinAction::LaunchWebConsole) => {
                match self.launch_web_console().await {
                    Ok(results) => results,
                    Err(error) => {
                        tracing::error!(error = %error, "web console not started");
                        vec![LaunchResult::failure(CONSOLE_FRONTEND_LABEL)]
                    }
                }
            }
            Action::External {
                label,
                working_dir,
                command,
            } => vec![self.launcher.launch(working_dir, command, label)],
        }
    }

    fn open_page(&self, url: &str, label: &str) {
        if !self.launcher.open_url(url, label).ok {
            println!("Could not open a browser; visit {url} manually.");
        }
    }

    fn launch_python_module(&self, module: &str, entry: &str, label: &str) -> LaunchResult {
        let dir: PathBuf = self.config.module_dir(module);
        let Some(python) = find_python(&self.config) else {
            tracing::error!(service = label, "no python interpreter found");
            return LaunchResult::failure(label);
        };
        self.launcher
            .launch(&dir, &LaunchCommand::new(python).arg(entry), label)
    }
}
