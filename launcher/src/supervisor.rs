//! The supervising loop
//!
//! Single-threaded: sleep, detect down servers, relaunch them (each relaunch
//! blocking for the launch delay), reconcile the registry, repeat.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::launcher::{LaunchCoordinator, ProcessSpawner};
use crate::monitor::{ProcessMonitor, ProcessTable, replace_down};
use crate::registry::InstanceRegistry;
use crate::store::DedicatedItem;

/// Outcome of one detection/relaunch cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Instances found down
    pub down: usize,
    /// Instances successfully relaunched
    pub relaunched: usize,
}

/// Owns the instance registry and keeps every launched server running
pub struct Supervisor<S, T> {
    launcher: LaunchCoordinator<S>,
    monitor: ProcessMonitor<T>,
    registry: InstanceRegistry,
    interval: Duration,
}

impl<S: ProcessSpawner, T: ProcessTable> Supervisor<S, T> {
    /// Launch every configured server and start supervising them
    pub fn start(mut launcher: LaunchCoordinator<S>, monitor: ProcessMonitor<T>, interval: Duration) -> Self {
        info!("Launching configured servers...");
        let registry = InstanceRegistry::new(launcher.launch_all());
        info!(count = registry.len(), "Launched configured servers");

        Self {
            launcher,
            monitor,
            registry,
            interval,
        }
    }

    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    /// Detect down servers, relaunch them and reconcile the registry
    pub fn run_cycle(&mut self) -> CycleReport {
        debug!(process = self.monitor.process_name(), "Checking for down servers...");

        let down = match self.monitor.detect_down(self.registry.instances()) {
            Ok(down) => down,
            Err(e) => {
                error!("Failed to check for down servers: {}", e);
                return CycleReport::default();
            }
        };

        if down.is_empty() {
            debug!("All servers are up");
            return CycleReport::default();
        }

        let names: Vec<&str> = down.iter().map(|instance| instance.file_name()).collect();
        warn!(
            "Found {} down {} ({})",
            down.len(),
            if down.len() == 1 { "server" } else { "servers" },
            names.join(", ")
        );

        info!("Launching down servers...");
        let descriptors: Vec<Arc<DedicatedItem>> = down.iter().map(|instance| Arc::clone(&instance.descriptor)).collect();
        let relaunched = self.launcher.launch_selected(&descriptors);
        info!("Re-launched {}/{} servers", relaunched.len(), down.len());

        self.registry = replace_down(&self.registry, &relaunched);

        CycleReport {
            down: down.len(),
            relaunched: relaunched.len(),
        }
    }

    /// Supervise forever
    pub fn run(mut self) -> ! {
        loop {
            debug!("Waiting to check for down servers...");
            thread::sleep(self.interval);
            self.run_cycle();
        }
    }
}
