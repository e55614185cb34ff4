pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod io;
pub mod merge;
pub mod paths;
pub mod types;

pub use error::{KiroError, Result};
