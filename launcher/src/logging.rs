//! Leveled logging to the console and an appended log file
//!
//! All components log through `tracing`. The subscriber installed here writes
//! every admitted event to stdout and to the launcher log file. The level
//! filter is reloadable because the level is only known once the descriptor
//! has been read, while the descriptor read itself must already be logged.
//!
//! Fatal lines are `error!` events on the [`FATAL`] target, which every level
//! admits.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use eyre::{Context, Result};
use tracing::warn;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Registry, fmt as tracing_fmt, reload};

/// Target used for fatal log lines
pub const FATAL: &str = "fatal";

/// Launcher log level, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    #[default]
    All,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    /// Level filter applied to ordinary (non-fatal) events
    fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::All => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Fatal => LevelFilter::OFF,
        }
    }

    /// Build the subscriber filter for this level
    pub fn targets(self) -> Targets {
        Targets::new()
            .with_target(FATAL, LevelFilter::ERROR)
            .with_default(self.level_filter())
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::All => "all",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        };
        write!(f, "{}", s)
    }
}

/// Error for an unrecognised log level name
#[derive(Debug, thiserror::Error)]
#[error("Invalid log level: {0}")]
pub struct InvalidLogLevel(String);

impl FromStr for LogLevel {
    type Err = InvalidLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(LogLevel::All),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            _ => Err(InvalidLogLevel(s.to_string())),
        }
    }
}

/// Handle to the process-wide logging service
pub struct Logging {
    handle: reload::Handle<Targets, Registry>,
    log_path: PathBuf,
    file_enabled: bool,
}

impl Logging {
    /// Install the subscriber, writing to stdout and appending to `log_path`
    ///
    /// Starts at [`LogLevel::All`]. If the log file cannot be opened the
    /// service still logs to the console and warns once.
    pub fn init(log_path: &Path) -> Result<Self> {
        let (filter, handle) = reload::Layer::new(LogLevel::default().targets());

        let file = open_log_file(log_path);
        let file_error = file.as_ref().err().map(|e| format!("{:#}", e));
        let file_layer = file
            .ok()
            .map(|file| tracing_fmt::layer().with_writer(file).with_ansi(false));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_fmt::layer().with_writer(std::io::stdout))
            .with(file_layer)
            .try_init()
            .context("Failed to install logging subscriber")?;

        if let Some(e) = &file_error {
            warn!("Logging to console only, log file {} unavailable: {}", log_path.display(), e);
        }

        Ok(Self {
            handle,
            log_path: log_path.to_path_buf(),
            file_enabled: file_error.is_none(),
        })
    }

    /// Replace the active log level
    pub fn set_level(&self, level: LogLevel) -> Result<()> {
        self.handle
            .reload(level.targets())
            .context("Failed to change log level")?;
        Ok(())
    }

    /// Apply a level name from the descriptor; unknown names keep the current level
    pub fn apply_level_name(&self, name: &str) -> Result<Option<LogLevel>> {
        match name.parse::<LogLevel>() {
            Ok(level) => {
                self.set_level(level)?;
                Ok(Some(level))
            }
            Err(e) => {
                warn!("{}, keeping current log level", e);
                Ok(None)
            }
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Whether lines are also appended to the log file
    pub fn file_enabled(&self) -> bool {
        self.file_enabled
    }
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open log file")
}
