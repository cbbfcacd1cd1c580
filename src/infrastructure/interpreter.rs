use std::path::{Path, PathBuf};

use crate::infrastructure::candidates::first_existing_file;
use crate::infrastructure::config::LauncherConfig;

const BUNDLED_PYTHON_DIR: &str = "python31211";

pub fn bundled_python_candidates(runtime_dir: &Path) -> Vec<PathBuf> {
    let base = runtime_dir.join(BUNDLED_PYTHON_DIR);
    vec![
        base.join("bin").join("python.exe"),
        base.join("python.exe"),
        base.join("bin").join("python3"),
        base.join("bin").join("python"),
    ]
}

/// Explicit config first, then the bundled runtime, then whatever is on `PATH`.
pub fn find_python(config: &LauncherConfig) -> Option<PathBuf> {
    if let Some(explicit) = config.python.as_ref().filter(|path| path.is_file()) {
        return Some(explicit.clone());
    }
    if let Some(bundled) = first_existing_file(&bundled_python_candidates(&config.runtime_dir)) {
        return Some(bundled);
    }
    ["python3", "python"]
        .iter()
        .find_map(|name| which::which(name).ok())
}
