//! Shared fixtures and recording doubles for the integration tests.
#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use onekey_launcher::domain::ports::{CommandRunner, ProcessLauncher};
use onekey_launcher::domain::types::{Invocation, LaunchCommand, LaunchResult, RunStatus};
use onekey_launcher::infrastructure::config::LauncherConfig;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// RecordingRunner
// ---------------------------------------------------------------------------

/// What a scripted [`RecordingRunner`] returns for a matching invocation.
#[derive(Clone, Debug)]
pub enum Scripted {
    Status(RunStatus),
    SpawnError(String),
}

/// CommandRunner double. Invocations are captured in call order; the reply is
/// taken from the first rule whose needle appears in the rendered command line,
/// then from the queued replies, then defaults to success.
pub struct RecordingRunner {
    rules: Mutex<Vec<(String, Scripted)>>,
    queued: Mutex<VecDeque<Scripted>>,
    pub captured: Mutex<Vec<(Invocation, Duration)>>,
}

impl RecordingRunner {
    pub fn succeeding() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            queued: Mutex::new(VecDeque::new()),
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn queued(replies: Vec<Scripted>) -> Self {
        let runner = Self::succeeding();
        *runner.queued.lock().unwrap() = replies.into();
        runner
    }

    pub fn when(self, needle: &str, reply: Scripted) -> Self {
        self.rules
            .lock()
            .unwrap()
            .push((needle.to_string(), reply));
        self
    }

    pub fn fails_when(self, needle: &str) -> Self {
        self.when(needle, Scripted::Status(failed(1)))
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.captured
            .lock()
            .unwrap()
            .iter()
            .map(|(invocation, _)| invocation.display())
            .collect()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.captured
            .lock()
            .unwrap()
            .iter()
            .map(|(invocation, _)| invocation.clone())
            .collect()
    }
}

pub fn failed(code: i32) -> RunStatus {
    RunStatus::Failed {
        code: Some(code),
        stderr: None,
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation, timeout: Duration) -> Result<RunStatus> {
        let line = invocation.display();
        self.captured
            .lock()
            .unwrap()
            .push((invocation.clone(), timeout));

        let ruled = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone());
        let reply = ruled.or_else(|| self.queued.lock().unwrap().pop_front());

        match reply {
            Some(Scripted::Status(status)) => Ok(status),
            Some(Scripted::SpawnError(message)) => bail!(message),
            None => Ok(RunStatus::Success),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingLauncher
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct LaunchCall {
    pub working_dir: PathBuf,
    pub command: LaunchCommand,
    pub label: String,
    pub at: tokio::time::Instant,
}

/// ProcessLauncher double that never spawns anything.
/// Browser opens are captured separately as `(url, label)`.
pub struct RecordingLauncher {
    failing_labels: Vec<String>,
    browser_fails: bool,
    pub captured: Mutex<Vec<LaunchCall>>,
    pub opened: Mutex<Vec<(String, String)>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self {
            failing_labels: Vec::new(),
            browser_fails: false,
            captured: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(labels: &[&str]) -> Self {
        Self {
            failing_labels: labels.iter().map(|label| label.to_string()).collect(),
            ..Self::new()
        }
    }

    pub fn without_browser(self) -> Self {
        Self {
            browser_fails: true,
            ..self
        }
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.captured
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.label.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<LaunchCall> {
        self.captured.lock().unwrap().clone()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(&self, working_dir: &Path, command: &LaunchCommand, label: &str) -> LaunchResult {
        self.captured.lock().unwrap().push(LaunchCall {
            working_dir: working_dir.to_path_buf(),
            command: command.clone(),
            label: label.to_string(),
            at: tokio::time::Instant::now(),
        });
        if self.failing_labels.iter().any(|failing| failing == label) {
            LaunchResult::failure(label)
        } else {
            LaunchResult::success(label)
        }
    }

    fn open_url(&self, url: &str, label: &str) -> LaunchResult {
        self.opened
            .lock()
            .unwrap()
            .push((url.to_string(), label.to_string()));
        if self.browser_fails {
            LaunchResult::failure(label)
        } else {
            LaunchResult::success(label)
        }
    }
}

// ---------------------------------------------------------------------------
// Bundle fixture
// ---------------------------------------------------------------------------

pub const BOT_ACCOUNT: &str = "10001";

/// A throwaway bundle tree with templates, helper scripts and a bundled
/// python placeholder. Nothing in it is ever executed.
pub struct BundleFixture {
    _temp: Option<TempDir>,
    pub root: PathBuf,
}

impl BundleFixture {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("MaiBotOneKey");
        let fixture = Self {
            root,
            _temp: Some(temp),
        };
        fixture.populate();
        fixture
    }

    /// Builds the bundle under `parent/name` instead of a fresh tempdir.
    pub fn at(parent: &Path, name: &str) -> Self {
        let fixture = Self {
            root: parent.join(name),
            _temp: None,
        };
        fixture.populate();
        fixture
    }

    fn populate(&self) {
        self.write(
            "modules/MaiBot/template/bot_config_template.toml",
            &format!("[bot]\nqq_account = {BOT_ACCOUNT}\nnickname = \"mai\"\n"),
        );
        self.write(
            "modules/MaiBot/template/model_config_template.toml",
            "[models]\n",
        );
        self.write("modules/MaiBot/template/template.env", "HOST=127.0.0.1\n");
        self.write(
            "modules/MaiBot-Napcat-Adapter/template.toml",
            "[napcat_server]\nport = 8095\n",
        );
        self.write("update_modules.py", "print('update')\n");
        self.write("init_napcat.py", "print('init')\n");
        self.write("start.py", "print('start')\n");
        self.write("runtime/python31211/bin/python.exe", "");
        fs::create_dir_all(self.root.join("modules/napcat")).unwrap();
        self.write("modules/napcat/NapCatWinBootMain.exe", "");
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn remove(&self, relative: &str) {
        let path = self.root.join(relative);
        if path.is_dir() {
            fs::remove_dir_all(path).unwrap();
        } else {
            fs::remove_file(path).unwrap();
        }
    }

    pub fn python(&self) -> PathBuf {
        self.root.join("runtime/python31211/bin/python.exe")
    }

    /// Node runtime, pnpm and the HMMLDemon directory the installer expects.
    pub fn with_node_runtime(&self) -> &Self {
        self.write("runtime/nodejs/node", "");
        self.write("runtime/nodejs/pnpm", "");
        fs::create_dir_all(self.root.join("modules/HMMLDemon")).unwrap();
        self
    }

    pub fn with_legacy_console(&self) -> &Self {
        self.write("runtime/nodejs/node", "");
        self.write("modules/HMMLPanel/server.cjs", "");
        self.write("modules/HMMLDemon/start.js", "");
        self
    }

    pub fn with_panel_v2_console(&self) -> &Self {
        self.write("modules/HMML2Panel/node", "");
        self.write("modules/HMML2Panel/server.cjs", "");
        self.write("modules/HMML2Backend/start.py", "");
        self
    }

    pub fn config(&self) -> LauncherConfig {
        let mut config = LauncherConfig::defaults_for_root(self.root.clone());
        config.settle_delay = Duration::ZERO;
        config.log_dir = self.root.join("logs");
        config
    }

    pub fn marker(&self) -> PathBuf {
        self.root.join("runtime/.initialized")
    }
}
