//! Launch error types

use std::path::PathBuf;
use thiserror::Error;

use crate::store::LoadError;

/// Errors launching a single dedicated server
///
/// All of them except [`LaunchError::WorkingDirectory`] only skip the
/// affected descriptor.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Dedicated file '{file_name}' does not exist at {path}")]
    OverrideMissing { file_name: String, path: PathBuf },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Failed to serialize '{file_name}': {source}")]
    Serialize {
        file_name: String,
        #[source]
        source: xmltree::Error,
    },

    #[error("Failed to write content of '{file_name}' into {path}: {source}")]
    WriteTarget {
        file_name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch server {program}, make sure it exists next to the configured ServerFilePath: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to change working directory to {path}: {source}")]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    /// Whether the override file was simply absent (logged as a warning)
    pub fn is_missing_override(&self) -> bool {
        matches!(self, LaunchError::OverrideMissing { .. })
    }
}
