use onekey_launcher::domain::types::MirrorEndpoint;
use onekey_launcher::infrastructure::config::{
    default_mirrors, LauncherConfig, ROOT_ENV, LauncherFileConfig, LauncherScriptsConfig,
    LauncherServicesConfig, LauncherWebConsoleConfig,
};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

struct CurrentDirGuard {
    original: PathBuf,
}

impl CurrentDirGuard {
    fn enter(path: &Path) -> Self {
        let original = std::env::current_dir().expect("current dir");
        std::env::set_current_dir(path).expect("set current dir");
        Self { original }
    }
}

impl Drop for CurrentDirGuard {
    fn drop(&mut self) {
        std::env::set_current_dir(&self.original).expect("restore current dir");
    }
}

struct EnvVarGuard {
    key: &'static str,
    original: Option<std::ffi::OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &Path) -> Self {
        let original = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, original }
    }

    fn unset(key: &'static str) -> Self {
        let original = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, original }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.original {
            Some(value) => std::env::set_var(self.key, value),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn defaults_match_bundle_layout() {
    let root = PathBuf::from("/bundle");
    let config = LauncherConfig::defaults_for_root(root.clone());

    assert_eq!(config.marker_path, root.join("runtime/.initialized"));
    assert_eq!(config.legacy_marker_path, root.join("runtime/.gitkeep"));
    assert_eq!(config.log_dir, root.join("logs/launcher"));
    assert_eq!(config.log_level, "info");
    assert_eq!(config.log_retention_days, 7);
    assert_eq!(config.script_timeout, Duration::from_secs(300));
    assert_eq!(config.main_start_timeout, Duration::from_secs(30_000));
    assert_eq!(config.registry_timeout, Duration::from_secs(30));
    assert_eq!(config.install_timeout, Duration::from_secs(600));
    assert_eq!(config.settle_delay, Duration::from_secs(3));
    assert_eq!(config.console_url, "http://localhost:7998");
    assert_eq!(
        config.napcat_login_url,
        "http://127.0.0.1:6099/webui/web_login?token=napcat"
    );
    assert_eq!(config.launch_dir, root);
    assert_eq!(config.mirrors, default_mirrors());
    assert_eq!(config.mirrors[0].label, "npmmirror");
    assert_eq!(config.mirrors[3].url, "https://registry.npmjs.org");
    assert_eq!(config.handoff, None);
    assert!(!config.napcat_headed);
}

#[test]
fn file_values_override_defaults() {
    let root = PathBuf::from("/bundle");
    let file_config = LauncherFileConfig {
        scripts: LauncherScriptsConfig {
            python: Some(PathBuf::from("runtime/py/python")),
            timeout_secs: Some(0),
            main_start_timeout_secs: Some(7200),
            ..LauncherScriptsConfig::default()
        },
        web_console: LauncherWebConsoleConfig {
            settle_delay_ms: Some(250),
            mirrors: Some(vec![MirrorEndpoint::new("local", "http://127.0.0.1:4873")]),
            ..LauncherWebConsoleConfig::default()
        },
        services: LauncherServicesConfig {
            napcat_headed: Some(true),
            handoff: Some("  webui ".to_string()),
            napcat_login_url: Some("http://127.0.0.1:6100/webui".to_string()),
        },
        ..LauncherFileConfig::default()
    };

    let config = LauncherConfig::from_inputs(file_config, root.clone());

    assert_eq!(config.python, Some(root.join("runtime/py/python")));
    assert_eq!(config.script_timeout, Duration::from_secs(1));
    assert_eq!(config.main_start_timeout, Duration::from_secs(7200));
    assert_eq!(config.napcat_login_url, "http://127.0.0.1:6100/webui");
    assert_eq!(config.settle_delay, Duration::from_millis(250));
    assert_eq!(config.mirrors.len(), 1);
    assert!(config.napcat_headed);
    assert_eq!(config.handoff.as_deref(), Some("webui"));
}

#[test]
fn empty_mirror_list_keeps_builtin_mirrors() {
    let file_config = LauncherFileConfig {
        web_console: LauncherWebConsoleConfig {
            mirrors: Some(Vec::new()),
            ..LauncherWebConsoleConfig::default()
        },
        ..LauncherFileConfig::default()
    };

    let config = LauncherConfig::from_inputs(file_config, PathBuf::from("/bundle"));

    assert_eq!(config.mirrors, default_mirrors());
}

#[test]
fn launcher_json_is_read_from_root() {
    let tmp = tempdir().unwrap();
    std::fs::write(
        tmp.path().join("launcher.json"),
        r#"{
            "logging": { "level": "WARNING", "retention_days": 3 },
            "web_console": { "url": "http://localhost:9000" },
            "services": { "handoff": "all" }
        }"#,
    )
    .unwrap();

    let config = LauncherConfig::from_root(tmp.path()).unwrap();

    assert_eq!(config.log_level, "warn");
    assert_eq!(config.log_retention_days, 3);
    assert_eq!(config.console_url, "http://localhost:9000");
    assert_eq!(config.handoff.as_deref(), Some("all"));
    assert_eq!(config.script_timeout, Duration::from_secs(300));
}

#[test]
fn malformed_launcher_json_is_an_error() {
    let tmp = tempdir().unwrap();
    std::fs::write(tmp.path().join("launcher.json"), "{ not json").unwrap();

    let err = LauncherConfig::from_root(tmp.path()).unwrap_err();

    assert!(format!("{err:#}").contains("invalid launcher config json"));
}

#[test]
#[serial]
fn load_roots_bundle_at_executable_directory() {
    let _env = EnvVarGuard::unset(ROOT_ENV);
    let tmp = tempdir().unwrap();
    let launch_dir = tmp.path().canonicalize().unwrap();
    let _guard = CurrentDirGuard::enter(&launch_dir);

    let config = LauncherConfig::load().unwrap();

    let exe_dir = std::env::current_exe().unwrap().parent().unwrap().to_path_buf();
    assert_eq!(config.root_dir, exe_dir);
    assert_eq!(config.config_path, exe_dir.join("launcher.json"));
    assert_eq!(config.launch_dir.canonicalize().unwrap(), launch_dir);
}

#[test]
#[serial]
fn root_env_overrides_executable_directory() {
    let bundle = tempdir().unwrap();
    std::fs::write(
        bundle.path().join("launcher.json"),
        r#"{ "scripts": { "main_start_timeout_secs": 60 } }"#,
    )
    .unwrap();
    let _env = EnvVarGuard::set(ROOT_ENV, bundle.path());
    let elsewhere = tempdir().unwrap();
    let _guard = CurrentDirGuard::enter(elsewhere.path());

    let config = LauncherConfig::load().unwrap();

    assert_eq!(config.root_dir, bundle.path());
    assert_eq!(config.main_start_timeout, Duration::from_secs(60));
    assert_eq!(
        config.launch_dir.canonicalize().unwrap(),
        elsewhere.path().canonicalize().unwrap()
    );
}
