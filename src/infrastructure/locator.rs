use std::fmt;
use std::path::PathBuf;

use crate::domain::types::{ConsoleHalf, ServiceLayout, WebConsoleLayout};
use crate::infrastructure::candidates::{all_dirs_exist, resolve_all, MissingRole, RoleCandidates};
use crate::infrastructure::config::LauncherConfig;
use crate::infrastructure::interpreter::bundled_python_candidates;

#[derive(Clone, Debug)]
pub struct HalfSpec {
    pub root: PathBuf,
    pub runtime: RoleCandidates,
    pub entry: RoleCandidates,
}

#[derive(Clone, Debug)]
pub struct LayoutGeneration {
    pub name: String,
    pub frontend: HalfSpec,
    pub backend: HalfSpec,
}

impl LayoutGeneration {
    fn roots_present(&self) -> bool {
        all_dirs_exist(&[self.frontend.root.as_path(), self.backend.root.as_path()])
    }

    fn resolve(&self) -> Result<WebConsoleLayout, LocateError> {
        let front_scope = format!("{} {}", self.name, ConsoleHalf::Frontend);
        let back_scope = format!("{} {}", self.name, ConsoleHalf::Backend);
        let front = resolve_all(&front_scope, &[&self.frontend.runtime, &self.frontend.entry]);
        let back = resolve_all(&back_scope, &[&self.backend.runtime, &self.backend.entry]);

        match (front, back) {
            (Ok(front), Ok(back)) => Ok(WebConsoleLayout {
                generation: self.name.clone(),
                frontend: ServiceLayout {
                    runtime_binary_path: front[0].clone(),
                    entry_script_path: front[1].clone(),
                    working_directory: self.frontend.root.clone(),
                },
                backend: ServiceLayout {
                    runtime_binary_path: back[0].clone(),
                    entry_script_path: back[1].clone(),
                    working_directory: self.backend.root.clone(),
                },
            }),
            (front, back) => {
                let mut missing = front.err().unwrap_or_default();
                missing.extend(back.err().unwrap_or_default());
                Err(LocateError::MissingFiles {
                    generation: self.name.clone(),
                    missing,
                })
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocateError {
    NoLayoutInstalled { generations: Vec<String> },
    MissingFiles {
        generation: String,
        missing: Vec<MissingRole>,
    },
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLayoutInstalled { generations } => write!(
                f,
                "no known web console layout installed (checked {})",
                generations.join(", ")
            ),
            Self::MissingFiles {
                generation,
                missing,
            } => {
                let details = missing
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "{generation} is installed but missing: {details}")
            }
        }
    }
}

impl std::error::Error for LocateError {}

/// Picks the newest installed web console generation. Nothing is cached; every
/// call inspects the disk again.
#[derive(Clone, Debug)]
pub struct ServiceLocator {
    generations: Vec<LayoutGeneration>,
}

impl ServiceLocator {
    pub fn new(generations: Vec<LayoutGeneration>) -> Self {
        Self { generations }
    }

    pub fn for_bundle(config: &LauncherConfig) -> Self {
        Self::new(vec![panel_v2_generation(config), legacy_generation(config)])
    }

    pub fn generations(&self) -> &[LayoutGeneration] {
        &self.generations
    }

    pub fn locate(&self) -> Result<WebConsoleLayout, LocateError> {
        let Some(generation) = self.generations.iter().find(|gen| gen.roots_present()) else {
            return Err(LocateError::NoLayoutInstalled {
                generations: self.generations.iter().map(|gen| gen.name.clone()).collect(),
            });
        };
        tracing::debug!(generation = %generation.name, "web console roots found");
        generation.resolve()
    }
}

fn panel_v2_generation(config: &LauncherConfig) -> LayoutGeneration {
    let frontend = config.module_dir("HMML2Panel");
    let backend = config.module_dir("HMML2Backend");
    let mut python = Vec::new();
    if let Some(explicit) = &config.python {
        python.push(explicit.clone());
    }
    python.extend(bundled_python_candidates(&config.runtime_dir));

    LayoutGeneration {
        name: "HMML2".to_string(),
        frontend: HalfSpec {
            runtime: RoleCandidates::new(
                "node runtime",
                [frontend.join("node.exe"), frontend.join("node")],
            ),
            entry: RoleCandidates::new("server script", [frontend.join("server.cjs")]),
            root: frontend,
        },
        backend: HalfSpec {
            runtime: RoleCandidates::new("python runtime", python),
            entry: RoleCandidates::new("entry script", [backend.join("start.py")]),
            root: backend,
        },
    }
}

fn legacy_generation(config: &LauncherConfig) -> LayoutGeneration {
    let frontend = config.module_dir("HMMLPanel");
    let backend = config.module_dir("HMMLDemon");
    let node_dir = config.node_dir();
    let node = [node_dir.join("node.exe"), node_dir.join("node")];

    LayoutGeneration {
        name: "HMML".to_string(),
        frontend: HalfSpec {
            runtime: RoleCandidates::new("node runtime", node.clone()),
            entry: RoleCandidates::new("server script", [frontend.join("server.cjs")]),
            root: frontend,
        },
        backend: HalfSpec {
            runtime: RoleCandidates::new("node runtime", node),
            entry: RoleCandidates::new("entry script", [backend.join("start.js")]),
            root: backend,
        },
    }
}
