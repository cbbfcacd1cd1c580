use std::fmt;
use std::path::{Path, PathBuf};

/// Accepted locations for one role, most preferred first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleCandidates {
    pub role: &'static str,
    pub paths: Vec<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingRole {
    pub scope: String,
    pub role: &'static str,
    pub tried: Vec<PathBuf>,
}

impl fmt::Display for MissingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self
            .tried
            .iter()
            .map(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            })
            .collect::<Vec<_>>()
            .join(" | ");
        write!(f, "{} {} (tried {names})", self.scope, self.role)
    }
}

impl RoleCandidates {
    pub fn new(role: &'static str, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            role,
            paths: paths.into_iter().collect(),
        }
    }

    pub fn resolve(&self, scope: &str) -> Result<PathBuf, MissingRole> {
        first_existing_file(&self.paths).ok_or_else(|| MissingRole {
            scope: scope.to_string(),
            role: self.role,
            tried: self.paths.clone(),
        })
    }
}

pub fn first_existing_file(paths: &[PathBuf]) -> Option<PathBuf> {
    paths.iter().find(|path| path.is_file()).cloned()
}

pub fn all_dirs_exist(dirs: &[&Path]) -> bool {
    dirs.iter().all(|dir| dir.is_dir())
}

/// Resolves every role, collecting all misses instead of stopping at the first.
pub fn resolve_all(
    scope: &str,
    roles: &[&RoleCandidates],
) -> Result<Vec<PathBuf>, Vec<MissingRole>> {
    let mut found = Vec::with_capacity(roles.len());
    let mut missing = Vec::new();
    for role in roles {
        match role.resolve(scope) {
            Ok(path) => found.push(path),
            Err(miss) => missing.push(miss),
        }
    }
    if missing.is_empty() {
        Ok(found)
    } else {
        Err(missing)
    }
}
