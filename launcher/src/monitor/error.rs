//! Monitor error types

use thiserror::Error;

/// Errors while checking server liveness
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Failed to enumerate processes named '{name}': {message}")]
    Enumerate { name: String, message: String },
}
