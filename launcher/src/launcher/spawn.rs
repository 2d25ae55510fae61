//! Spawning server processes

use std::io;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

use crate::registry::ProcessId;

/// Starts a server executable and reports its process id
pub trait ProcessSpawner {
    fn spawn(&mut self, program: &Path) -> io::Result<ProcessId>;
}

/// Spawns real OS processes
///
/// Child handles are kept so that exited servers get reaped instead of
/// lingering as zombies.
#[derive(Debug, Default)]
pub struct SystemSpawner {
    children: Vec<Child>,
}

impl SystemSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect exit statuses of children that have terminated
    pub fn reap(&mut self) {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = child.id(), %status, "SystemSpawner::reap: child exited");
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(pid = child.id(), "Failed to query server process state: {}", e);
                false
            }
        });
    }

    /// Number of children not yet reaped
    pub fn tracked(&self) -> usize {
        self.children.len()
    }
}

impl ProcessSpawner for SystemSpawner {
    fn spawn(&mut self, program: &Path) -> io::Result<ProcessId> {
        self.reap();

        let child = Command::new(program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let pid = ProcessId(child.id());
        debug!(?program, %pid, "SystemSpawner::spawn: spawned");
        self.children.push(child);
        Ok(pid)
    }
}
