//! Conquest Launcher - multi-instance supervisor for LOTR Conquest dedicated servers
//!
//! The dedicated server is single-threaded and reads exactly one config file
//! (the *target file*) at its own startup. To run several differently
//! configured servers side by side, the launcher writes each instance's
//! override document into that shared file right before spawning it, then
//! keeps polling the process table and relaunches servers that died.
//!
//! # Modules
//!
//! - [`config`] - runtime settings (paths, process name, timings)
//! - [`logging`] - leveled console + file logging
//! - [`store`] - multi-server descriptor and override documents
//! - [`registry`] - launched instances in launch order
//! - [`launcher`] - merge-and-launch with level randomization
//! - [`monitor`] - down detection and registry reconciliation
//! - [`supervisor`] - the polling loop tying it together

pub mod config;
pub mod launcher;
pub mod logging;
pub mod monitor;
pub mod registry;
pub mod store;
pub mod supervisor;

// Re-export commonly used types
pub use config::Config;
pub use launcher::{LaunchCoordinator, LaunchError, ProcessSpawner, SystemSpawner};
pub use logging::{LogLevel, Logging};
pub use monitor::{MonitorError, ProcessMonitor, ProcessTable, SystemProcessTable, replace_down};
pub use registry::{Instance, InstanceRegistry, ProcessId};
pub use store::{ConfigError, DedicatedItem, LoadError, MultiServerConfig, OverrideDocument};
pub use supervisor::{CycleReport, Supervisor};
