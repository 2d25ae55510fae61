//! Down detection and registry reconciliation

use tracing::debug;

use super::error::MonitorError;
use super::process_table::ProcessTable;
use crate::registry::{Instance, InstanceRegistry};

/// Checks which launched servers are no longer running
///
/// Liveness is decided by process id alone: an instance is up while some
/// process with the server's name carries its pid.
pub struct ProcessMonitor<T> {
    process_name: String,
    table: T,
}

impl<T: ProcessTable> ProcessMonitor<T> {
    pub fn new(process_name: impl Into<String>, table: T) -> Self {
        Self {
            process_name: process_name.into(),
            table,
        }
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Instances whose pid is absent from the process table, in their original order
    pub fn detect_down(&mut self, instances: &[Instance]) -> Result<Vec<Instance>, MonitorError> {
        let running = self.table.running_pids(&self.process_name)?;
        debug!(
            expected = instances.len(),
            running = running.len(),
            "ProcessMonitor::detect_down: compared"
        );

        Ok(instances
            .iter()
            .filter(|instance| !running.contains(&instance.pid))
            .cloned()
            .collect())
    }
}

/// Registry with every slot matching a relaunched instance's file name replaced
///
/// `registry` itself is left untouched. Relaunched instances without a
/// matching slot are ignored.
pub fn replace_down(registry: &InstanceRegistry, relaunched: &[Instance]) -> InstanceRegistry {
    let mut rebuilt = registry.clone();
    for instance in relaunched {
        let replaced = rebuilt.replace_by_file_name(instance);
        debug!(file_name = instance.file_name(), replaced, "replace_down: replaced slots");
    }
    rebuilt
}
