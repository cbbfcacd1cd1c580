use serde::Deserialize;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// One directory or config file the bundle needs before first start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigSpec {
    pub name: String,
    pub target_path: PathBuf,
    pub template_path: Option<PathBuf>,
    pub is_directory: bool,
}

impl ConfigSpec {
    pub fn directory(name: impl Into<String>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            target_path: target_path.into(),
            template_path: None,
            is_directory: true,
        }
    }

    pub fn file(
        name: impl Into<String>,
        target_path: impl Into<PathBuf>,
        template_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            target_path: target_path.into(),
            template_path: Some(template_path.into()),
            is_directory: false,
        }
    }

    /// A file entry with no template; it can only be satisfied if it already exists.
    pub fn untemplated_file(name: impl Into<String>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            target_path: target_path.into(),
            template_path: None,
            is_directory: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct MirrorEndpoint {
    pub label: String,
    pub url: String,
}

impl MirrorEndpoint {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    NotYetRun,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleHalf {
    Frontend,
    Backend,
}

impl ConsoleHalf {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
        }
    }
}

impl fmt::Display for ConsoleHalf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved files for one half of the web console.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceLayout {
    pub runtime_binary_path: PathBuf,
    pub entry_script_path: PathBuf,
    pub working_directory: PathBuf,
}

impl ServiceLayout {
    pub fn launch_command(&self) -> LaunchCommand {
        LaunchCommand::new(&self.runtime_binary_path).arg(self.entry_script_path.as_os_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebConsoleLayout {
    pub generation: String,
    pub frontend: ServiceLayout,
    pub backend: ServiceLayout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl LaunchCommand {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn display(&self) -> String {
        let mut rendered = self.program.display().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        rendered
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchResult {
    pub ok: bool,
    pub label: String,
}

impl LaunchResult {
    pub fn success(label: impl Into<String>) -> Self {
        Self {
            ok: true,
            label: label.into(),
        }
    }

    pub fn failure(label: impl Into<String>) -> Self {
        Self {
            ok: false,
            label: label.into(),
        }
    }
}

/// Logical AND over one phase's launches. An empty phase counts as success.
pub fn all_launched(results: &[LaunchResult]) -> bool {
    results.iter().all(|result| result.ok)
}

/// A blocking external program run: program + args in a directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
    pub path_prefix: Option<PathBuf>,
    pub capture_output: bool,
}

impl Invocation {
    pub fn new(program: impl AsRef<Path>, working_dir: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            working_dir: working_dir.as_ref().to_path_buf(),
            path_prefix: None,
            capture_output: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_path_prefix(mut self, dir: impl AsRef<Path>) -> Self {
        self.path_prefix = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture_output = true;
        self
    }

    pub fn display(&self) -> String {
        LaunchCommand {
            program: self.program.clone(),
            args: self.args.clone(),
        }
        .display()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed {
        code: Option<i32>,
        stderr: Option<String>,
    },
    TimedOut,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}
