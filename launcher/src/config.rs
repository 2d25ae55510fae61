//! Launcher runtime settings and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory (below the user's documents folder) the Conquest server keeps its files in
pub const SERVER_DIR_NAME: &str = "The Lord of the Rings - Conquest (Server PC)";

/// Name of the project-local settings file
const LOCAL_CONFIG_FILE: &str = ".conquest-launcher.yml";

/// Runtime settings for the launcher
///
/// Built once at startup and handed to every component that needs a path,
/// a process name or a timing value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the descriptor, override files, target file and log
    #[serde(rename = "server-dir")]
    pub server_dir: PathBuf,

    /// File name of the multi-server descriptor
    #[serde(rename = "descriptor-file-name")]
    pub descriptor_file_name: String,

    /// File name of the launcher log
    #[serde(rename = "log-file-name")]
    pub log_file_name: String,

    /// Process name of the dedicated server as seen in the process table
    #[serde(rename = "server-process-name")]
    pub server_process_name: String,

    /// Delay after each successful launch in milliseconds
    #[serde(rename = "launch-timeout-ms")]
    pub launch_timeout_ms: u64,

    /// Interval between down checks in milliseconds
    #[serde(rename = "down-check-interval-ms")]
    pub down_check_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_dir: default_server_dir(),
            descriptor_file_name: "MultiDedicated.xml".to_string(),
            log_file_name: "MultiDedicated.log".to_string(),
            server_process_name: "ConquestServer".to_string(),
            launch_timeout_ms: 30_000,
            down_check_interval_ms: 120_000,
        }
    }
}

fn default_server_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SERVER_DIR_NAME)
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// `./.conquest-launcher.yml`, then the user config directory, then defaults.
    /// A settings file that exists but cannot be parsed is an error.
    pub fn load() -> Result<Self> {
        let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("conquest-launcher").join("conquest-launcher.yml"));
        }

        for path in candidates {
            if path.exists() {
                return Self::load_from_file(&path).context(format!("Failed to load config from {}", path.display()));
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Full path of the multi-server descriptor
    pub fn descriptor_path(&self) -> PathBuf {
        self.server_dir.join(&self.descriptor_file_name)
    }

    /// Full path of the launcher log
    pub fn log_path(&self) -> PathBuf {
        self.server_dir.join(&self.log_file_name)
    }

    pub fn launch_timeout(&self) -> Duration {
        Duration::from_millis(self.launch_timeout_ms)
    }

    pub fn down_check_interval(&self) -> Duration {
        Duration::from_millis(self.down_check_interval_ms)
    }
}
