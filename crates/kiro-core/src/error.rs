use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KiroError {
    #[error("no workspace folder open")]
    NoProject,

    #[error("feature is required")]
    FeatureRequired,

    #[error("invalid phase '{0}': expected one of requirements, design, tasks, all")]
    InvalidPhase(String),

    #[error("choice index {0} is out of range")]
    InvalidChoice(usize),

    #[error("src not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("shell '{0}' not found on PATH")]
    ShellNotFound(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, KiroError>;
