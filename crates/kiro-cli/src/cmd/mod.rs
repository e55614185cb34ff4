pub mod config;
pub mod merge;
pub mod validate;

/// A failure the user has already been shown; only the exit status is left.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Reported(pub String);
