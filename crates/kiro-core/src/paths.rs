use crate::types::ValidationScript;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const KIRO_DIR: &str = ".kiro";
pub const GIT_DIR: &str = ".git";
pub const CONFIG_FILE: &str = ".kiro/tools.yaml";
pub const DEFAULT_SCRIPTS_DIR: &str = "scripts";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn script_path(root: &Path, scripts_dir: &str, script: ValidationScript) -> PathBuf {
    root.join(scripts_dir).join(script.filename())
}

/// `dest.bak.<stamp>`, next to `dest`.
pub fn backup_path(dest: &Path, stamp: &str) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".bak.");
    name.push(stamp);
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// Feature names
// ---------------------------------------------------------------------------

static KEBAB_RE: OnceLock<Regex> = OnceLock::new();

fn kebab_re() -> &'static Regex {
    KEBAB_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Whether `name` looks like `user-login`. Advisory only: feature names are
/// never rejected for failing this.
pub fn is_kebab_case(name: &str) -> bool {
    kebab_re().is_match(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
