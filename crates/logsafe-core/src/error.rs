//! Errors raised at the edges of the engine
//!
//! Analysis itself is total and never fails; only loading configuration can.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("annotation name for {role} must not be empty")]
    EmptyAnnotationName { role: &'static str },

    #[error("max_iterations must be greater than zero")]
    ZeroIterationBound,
}
