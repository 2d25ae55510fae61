//! ConfigStore error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors loading the multi-server descriptor; all of them are fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: xmltree::ParseError,
    },

    #[error("Expected root element <{expected}> in {path}, found <{found}>")]
    UnexpectedRoot {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },

    #[error("Missing required attribute '{attribute}' in {path}")]
    MissingAttribute { path: PathBuf, attribute: &'static str },
}

/// Errors loading a per-instance override document; the instance is skipped
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: xmltree::ParseError,
    },

    #[error("Expected root element <{expected}> in {path}, found <{found}>")]
    UnexpectedRoot {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },
}
