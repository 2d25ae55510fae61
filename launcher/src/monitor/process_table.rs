//! OS process table access

use std::collections::HashSet;

use sysinfo::{ProcessStatus, ProcessesToUpdate, System};
use tracing::debug;

use super::error::MonitorError;
use crate::registry::ProcessId;

/// Lists live process ids by process name
pub trait ProcessTable {
    fn running_pids(&mut self, name: &str) -> Result<HashSet<ProcessId>, MonitorError>;
}

/// Whether an OS process name refers to `expected`
///
/// A trailing `.exe` is ignored and the comparison is ASCII case-insensitive,
/// so `ConquestServer.exe` matches `ConquestServer`.
pub fn matches_process_name(name: &str, expected: &str) -> bool {
    let stem = match name.len().checked_sub(4).and_then(|at| name.get(at..).map(|ext| (at, ext))) {
        Some((at, ext)) if ext.eq_ignore_ascii_case(".exe") => &name[..at],
        _ => name,
    };
    stem.eq_ignore_ascii_case(expected)
}

/// Process table backed by `sysinfo`
pub struct SystemProcessTable {
    system: System,
}

impl Default for SystemProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProcessTable {
    pub fn new() -> Self {
        Self { system: System::new() }
    }
}

impl ProcessTable for SystemProcessTable {
    fn running_pids(&mut self, name: &str) -> Result<HashSet<ProcessId>, MonitorError> {
        self.system.refresh_processes(ProcessesToUpdate::All, true);

        let pids: HashSet<ProcessId> = self
            .system
            .processes()
            .iter()
            .filter(|(_, process)| !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead))
            .filter(|(_, process)| matches_process_name(&process.name().to_string_lossy(), name))
            .map(|(pid, _)| ProcessId(pid.as_u32()))
            .collect();

        debug!(name, count = pids.len(), "SystemProcessTable::running_pids: found");
        Ok(pids)
    }
}
