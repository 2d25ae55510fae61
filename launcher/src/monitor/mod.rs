//! ProcessMonitor: finds dead server processes and reconciles the registry
//! after they have been relaunched

mod error;
mod observer;
mod process_table;

pub use error::MonitorError;
pub use observer::{ProcessMonitor, replace_down};
pub use process_table::{ProcessTable, SystemProcessTable, matches_process_name};
