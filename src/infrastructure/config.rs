use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::types::MirrorEndpoint;

const CONFIG_FILE_NAME: &str = "launcher.json";
const RUNTIME_DIR: &str = "runtime";
const MARKER_FILE_NAME: &str = ".initialized";
const LEGACY_MARKER_FILE_NAME: &str = ".gitkeep";
const DEFAULT_LOG_DIR: &str = "logs/launcher";
const DEFAULT_CONSOLE_URL: &str = "http://localhost:7998";
const DEFAULT_NAPCAT_LOGIN_URL: &str = "http://127.0.0.1:6099/webui/web_login?token=napcat";
/// Overrides the bundle root, which otherwise is the executable's directory.
pub const ROOT_ENV: &str = "ONEKEY_LAUNCHER_ROOT";

#[derive(Clone, Debug)]
pub struct LauncherConfig {
    pub root_dir: PathBuf,
    /// Directory the launcher was started from; only checked for illegal characters.
    pub launch_dir: PathBuf,
    pub config_path: PathBuf,
    pub runtime_dir: PathBuf,
    pub marker_path: PathBuf,
    pub legacy_marker_path: PathBuf,
    pub log_level: String,
    pub log_retention_days: u16,
    pub log_dir: PathBuf,
    pub python: Option<PathBuf>,
    pub update_script: String,
    pub gateway_init_script: String,
    pub main_start_script: String,
    pub script_timeout: Duration,
    pub main_start_timeout: Duration,
    pub registry_timeout: Duration,
    pub install_timeout: Duration,
    pub settle_delay: Duration,
    pub console_url: String,
    pub napcat_login_url: String,
    pub mirrors: Vec<MirrorEndpoint>,
    pub napcat_headed: bool,
    pub handoff: Option<String>,
}

impl LauncherConfig {
    /// Config for the bundle the running executable belongs to, started from the
    /// current directory.
    pub fn load() -> Result<Self> {
        let launch_dir = env::current_dir().context("failed to resolve current directory")?;
        let mut config = Self::from_root(&resolve_root_dir()?)?;
        config.launch_dir = launch_dir;
        Ok(config)
    }

    pub fn from_root(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE_NAME);
        let file_config = if config_path.exists() {
            read_config_file(&config_path)?
        } else {
            LauncherFileConfig::default()
        };
        Ok(Self::from_inputs(file_config, root.to_path_buf()))
    }

    pub fn defaults_for_root(root_dir: PathBuf) -> Self {
        let runtime_dir = root_dir.join(RUNTIME_DIR);
        Self {
            launch_dir: root_dir.clone(),
            config_path: root_dir.join(CONFIG_FILE_NAME),
            marker_path: runtime_dir.join(MARKER_FILE_NAME),
            legacy_marker_path: runtime_dir.join(LEGACY_MARKER_FILE_NAME),
            runtime_dir,
            log_level: "info".to_string(),
            log_retention_days: 7,
            log_dir: root_dir.join(DEFAULT_LOG_DIR),
            python: None,
            update_script: "update_modules.py".to_string(),
            gateway_init_script: "init_napcat.py".to_string(),
            main_start_script: "start.py".to_string(),
            script_timeout: Duration::from_secs(300),
            main_start_timeout: Duration::from_secs(30_000),
            registry_timeout: Duration::from_secs(30),
            install_timeout: Duration::from_secs(600),
            settle_delay: Duration::from_secs(3),
            console_url: DEFAULT_CONSOLE_URL.to_string(),
            napcat_login_url: DEFAULT_NAPCAT_LOGIN_URL.to_string(),
            mirrors: default_mirrors(),
            napcat_headed: false,
            handoff: None,
            root_dir,
        }
    }

    pub fn from_inputs(file_config: LauncherFileConfig, root_dir: PathBuf) -> Self {
        let mut config = Self::defaults_for_root(root_dir);

        if let Some(level) = file_config.logging.level {
            config.log_level = normalize_log_level(level);
        }
        if let Some(retention_days) = file_config.logging.retention_days {
            config.log_retention_days = retention_days.max(1);
        }
        if let Some(directory) = file_config.logging.directory {
            config.log_dir = resolve_under_root(&config.root_dir, directory);
        }

        if let Some(python) = file_config.scripts.python {
            config.python = Some(resolve_under_root(&config.root_dir, python));
        }
        if let Some(update) = file_config.scripts.update {
            config.update_script = update;
        }
        if let Some(gateway_init) = file_config.scripts.gateway_init {
            config.gateway_init_script = gateway_init;
        }
        if let Some(main_start) = file_config.scripts.main_start {
            config.main_start_script = main_start;
        }
        if let Some(timeout_secs) = file_config.scripts.timeout_secs {
            config.script_timeout = Duration::from_secs(timeout_secs.max(1));
        }
        if let Some(timeout_secs) = file_config.scripts.main_start_timeout_secs {
            config.main_start_timeout = Duration::from_secs(timeout_secs.max(1));
        }

        if let Some(url) = file_config.web_console.url {
            config.console_url = url;
        }
        if let Some(settle_delay_ms) = file_config.web_console.settle_delay_ms {
            config.settle_delay = Duration::from_millis(settle_delay_ms);
        }
        if let Some(timeout_secs) = file_config.web_console.registry_timeout_secs {
            config.registry_timeout = Duration::from_secs(timeout_secs.max(1));
        }
        if let Some(timeout_secs) = file_config.web_console.install_timeout_secs {
            config.install_timeout = Duration::from_secs(timeout_secs.max(1));
        }
        if let Some(mirrors) = file_config.web_console.mirrors {
            if mirrors.is_empty() {
                tracing::warn!("launcher.json lists no mirrors; keeping the built-in mirror list");
            } else {
                config.mirrors = mirrors;
            }
        }

        if let Some(url) = file_config.services.napcat_login_url {
            config.napcat_login_url = url;
        }
        if let Some(headed) = file_config.services.napcat_headed {
            config.napcat_headed = headed;
        }
        config.handoff = file_config
            .services
            .handoff
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        config
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.root_dir.join("modules")
    }

    pub fn module_dir(&self, name: &str) -> PathBuf {
        self.modules_dir().join(name)
    }

    pub fn bot_config_path(&self) -> PathBuf {
        self.module_dir("MaiBot").join("config").join("bot_config.toml")
    }

    pub fn bot_config_template_path(&self) -> PathBuf {
        self.module_dir("MaiBot")
            .join("template")
            .join("bot_config_template.toml")
    }

    pub fn node_dir(&self) -> PathBuf {
        self.runtime_dir.join("nodejs")
    }
}

pub fn default_mirrors() -> Vec<MirrorEndpoint> {
    vec![
        MirrorEndpoint::new("npmmirror", "https://registry.npmmirror.com"),
        MirrorEndpoint::new("tencent", "https://mirrors.cloud.tencent.com/npm/"),
        MirrorEndpoint::new("huawei", "https://repo.huaweicloud.com/repository/npm/"),
        MirrorEndpoint::new("npmjs", "https://registry.npmjs.org"),
    ]
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct LauncherFileConfig {
    pub logging: LauncherLoggingConfig,
    pub scripts: LauncherScriptsConfig,
    pub web_console: LauncherWebConsoleConfig,
    pub services: LauncherServicesConfig,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct LauncherLoggingConfig {
    pub level: Option<String>,
    pub retention_days: Option<u16>,
    pub directory: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct LauncherScriptsConfig {
    pub python: Option<PathBuf>,
    pub update: Option<String>,
    pub gateway_init: Option<String>,
    pub main_start: Option<String>,
    pub timeout_secs: Option<u64>,
    pub main_start_timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct LauncherWebConsoleConfig {
    pub url: Option<String>,
    pub settle_delay_ms: Option<u64>,
    pub registry_timeout_secs: Option<u64>,
    pub install_timeout_secs: Option<u64>,
    pub mirrors: Option<Vec<MirrorEndpoint>>,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct LauncherServicesConfig {
    pub napcat_headed: Option<bool>,
    pub napcat_login_url: Option<String>,
    pub handoff: Option<String>,
}

pub fn read_config_file(path: &Path) -> Result<LauncherFileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read launcher config: {}", path.display()))?;
    serde_json::from_str::<LauncherFileConfig>(&raw)
        .with_context(|| format!("invalid launcher config json: {}", path.display()))
}

fn resolve_root_dir() -> Result<PathBuf> {
    if let Some(root) = env::var_os(ROOT_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    let exe = env::current_exe().context("failed to resolve launcher executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("launcher executable has no parent: {}", exe.display()))
}

fn resolve_under_root(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

fn normalize_log_level(level: String) -> String {
    match level.to_ascii_lowercase().as_str() {
        "trace" => "trace".to_string(),
        "debug" => "debug".to_string(),
        "info" => "info".to_string(),
        "warning" | "warn" => "warn".to_string(),
        "error" => "error".to_string(),
        _ => "info".to_string(),
    }
}
