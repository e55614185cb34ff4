use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Per-project settings read from `.kiro/tools.yaml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Label shown above the validation run.
    #[serde(default = "default_terminal_name")]
    pub terminal_name: String,
    /// Program the validation scripts are handed to.
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Directory holding the validation scripts, relative to the project root.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,
    /// Pre-filled answer for the feature name prompt.
    #[serde(default = "default_feature")]
    pub default_feature: String,
}

fn default_terminal_name() -> String {
    "Kiro Validator".to_string()
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_scripts_dir() -> String {
    paths::DEFAULT_SCRIPTS_DIR.to_string()
}

fn default_feature() -> String {
    "example-feature".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            terminal_name: default_terminal_name(),
            shell: default_shell(),
            scripts_dir: default_scripts_dir(),
            default_feature: default_feature(),
        }
    }
}

impl Config {
    /// Load `.kiro/tools.yaml` from `root`, falling back to defaults when the
    /// file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let data = std::fs::read_to_string(&path)?;
        // An empty file deserializes to unit, not to a struct with defaults.
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Write the default config to `root` unless one is already there.
    /// Returns true if a file was written.
    pub fn init(root: &Path) -> Result<bool> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(&Config::default())?;
        crate::io::write_if_missing(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.shell.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "shell is empty".to_string(),
            });
        }

        if self.scripts_dir.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "scripts_dir is empty".to_string(),
            });
        } else if Path::new(&self.scripts_dir).is_absolute() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "scripts_dir '{}' is absolute; scripts are normally kept inside the project",
                    self.scripts_dir
                ),
            });
        }

        if self.terminal_name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "terminal_name is empty".to_string(),
            });
        }

        if !self.default_feature.is_empty() && !paths::is_kebab_case(&self.default_feature) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "default_feature '{}' is not kebab-case",
                    self.default_feature
                ),
            });
        }

        warnings
    }
}
