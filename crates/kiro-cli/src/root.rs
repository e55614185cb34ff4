use kiro_core::paths::{GIT_DIR, KIRO_DIR};
use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `KIRO_ROOT` env var (passed in as `explicit`); it must
///    be an existing directory
/// 2. Walk upward from `cwd` looking for `.kiro/`
/// 3. Walk upward from `cwd` looking for `.git/`
///
/// Returns `None` when no project is open.
pub fn find_project_root(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        if !p.is_dir() {
            tracing::debug!(root = %p.display(), "explicit root is not a directory");
            return None;
        }
        return p.canonicalize().ok();
    }

    let cwd = std::env::current_dir().ok()?;
    find_from(&cwd)
}

fn find_from(start: &Path) -> Option<PathBuf> {
    find_upward(start, KIRO_DIR).or_else(|| find_upward(start, GIT_DIR))
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}
