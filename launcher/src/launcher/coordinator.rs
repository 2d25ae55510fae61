//! Merge-and-launch of dedicated servers through the shared target file

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, info, warn};

use super::error::LaunchError;
use super::randomize::{LevelRandomization, rotate_start_level, shuffle_levels};
use super::spawn::ProcessSpawner;
use crate::config::Config;
use crate::registry::Instance;
use crate::store::{self, DedicatedItem, MultiServerConfig, OverrideDocument};

const PLASMA: &str = "Plasma";

/// Apply a descriptor's overrides to its document
///
/// Port, then game name, then at most one level transform.
pub fn apply_overrides<R: Rng + ?Sized>(doc: &mut OverrideDocument, item: &DedicatedItem, rng: &mut R) {
    if let Some(port) = item.port_override() {
        debug!("Writing port...");
        doc.set_value(PLASMA, "Port", &port.to_string());
    }

    if let Some(game_name) = item.game_name_override() {
        debug!("Writing game name...");
        doc.set_value(PLASMA, "GameName", game_name);
    }

    match LevelRandomization::for_item(item) {
        LevelRandomization::Shuffle => {
            debug!("Randomizing level order...");
            if !doc.reorder_levels(|levels| {
                shuffle_levels(levels, rng);
                true
            }) {
                debug!(file_name = %item.file_name, "No Levels section, level order unchanged");
            }
        }
        LevelRandomization::RotateStart => {
            debug!("Randomizing start level...");
            if !doc.reorder_levels(|levels| rotate_start_level(levels, rng).is_some_and(|start| start != 0)) {
                debug!(file_name = %item.file_name, "No Levels section, start level unchanged");
            }
        }
        LevelRandomization::None => {}
    }
}

/// Launches dedicated servers one at a time
///
/// Every server reads the same target file once at its own startup and gives
/// no signal when it is done. Launches therefore run strictly in sequence and
/// each successful spawn is followed by a fixed delay before the target file
/// is overwritten again. A server that takes longer than that delay to read
/// its config can still pick up the next instance's settings.
pub struct LaunchCoordinator<S> {
    server_dir: PathBuf,
    target_path: PathBuf,
    server_file_path: PathBuf,
    server_program: PathBuf,
    launch_timeout: Duration,
    dedicated: Vec<Arc<DedicatedItem>>,
    spawner: S,
}

impl<S: ProcessSpawner> LaunchCoordinator<S> {
    pub fn new(config: &Config, descriptor: &MultiServerConfig, spawner: S) -> Self {
        debug!(server_dir = ?config.server_dir, "LaunchCoordinator::new: called");

        // Resolved now so that later working directory changes do not move it
        let server_dir = std::path::absolute(&config.server_dir).unwrap_or_else(|e| {
            warn!(server_dir = ?config.server_dir, "Failed to resolve server directory: {}", e);
            config.server_dir.clone()
        });
        let server_file_path = descriptor.server_file_path.clone();

        // The server is started by name from its own directory
        let server_program = match server_file_path.file_name() {
            Some(name) => Path::new(".").join(name),
            None => server_file_path.clone(),
        };

        Self {
            target_path: server_dir.join(&descriptor.target_file_name),
            server_dir,
            server_file_path,
            server_program,
            launch_timeout: config.launch_timeout(),
            dedicated: descriptor.dedicated.clone(),
            spawner,
        }
    }

    /// Path of the shared config file the server reads at startup
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Program path handed to the spawner
    pub fn server_program(&self) -> &Path {
        &self.server_program
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Change into the server executable's directory
    ///
    /// The server resolves its assets relative to the working directory and
    /// crashes at startup otherwise. Returns whether the directory changed.
    pub fn set_working_directory(&self) -> Result<bool, LaunchError> {
        let Some(server_dir) = self.server_file_path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
            info!("Current directory was not changed");
            return Ok(false);
        };

        let current = env::current_dir().map_err(|source| LaunchError::WorkingDirectory {
            path: server_dir.to_path_buf(),
            source,
        })?;

        if current == server_dir || server_dir.canonicalize().is_ok_and(|dir| dir == current) {
            info!("Current directory was not changed");
            return Ok(false);
        }

        env::set_current_dir(server_dir).map_err(|source| LaunchError::WorkingDirectory {
            path: server_dir.to_path_buf(),
            source,
        })?;
        info!("Current directory was changed to '{}'", server_dir.display());
        Ok(true)
    }

    /// Launch every dedicated entry of the descriptor
    pub fn launch_all(&mut self) -> Vec<Instance> {
        let dedicated = self.dedicated.clone();
        self.launch_selected(&dedicated)
    }

    /// Launch the given entries in order, skipping any that fail
    ///
    /// Sleeps for the launch timeout after every successful spawn.
    pub fn launch_selected(&mut self, items: &[Arc<DedicatedItem>]) -> Vec<Instance> {
        let total = items.len();
        let mut instances = Vec::with_capacity(total);

        for (index, item) in items.iter().enumerate() {
            info!("Launching server {}/{} ({})...", index + 1, total, item.file_name);

            match self.launch_single(item) {
                Ok(instance) => {
                    info!(pid = %instance.pid, "Launched server ({})", item.file_name);
                    instances.push(instance);

                    debug!("Waiting for server launch...");
                    thread::sleep(self.launch_timeout);
                }
                Err(e) if e.is_missing_override() => {
                    warn!("Filtered out not existent dedicated file '{}': {}", item.file_name, e);
                }
                Err(e) => {
                    error!("Failed to launch server ({}): {}", item.file_name, e);
                }
            }
        }

        instances
    }

    fn launch_single(&mut self, item: &Arc<DedicatedItem>) -> Result<Instance, LaunchError> {
        let override_path = self.server_dir.join(&item.file_name);
        if !override_path.is_file() {
            return Err(LaunchError::OverrideMissing {
                file_name: item.file_name.clone(),
                path: override_path,
            });
        }

        let mut doc = store::load_override_document(&override_path)?;
        apply_overrides(&mut doc, item, &mut rand::rng());

        let content = doc.to_bytes().map_err(|source| LaunchError::Serialize {
            file_name: item.file_name.clone(),
            source,
        })?;

        fs::write(&self.target_path, content).map_err(|source| LaunchError::WriteTarget {
            file_name: item.file_name.clone(),
            path: self.target_path.clone(),
            source,
        })?;
        debug!("Wrote content of '{}' into '{}'", item.file_name, self.target_path.display());

        let pid = self
            .spawner
            .spawn(&self.server_program)
            .map_err(|source| LaunchError::Spawn {
                program: self.server_program.clone(),
                source,
            })?;

        Ok(Instance::new(pid, Arc::clone(item)))
    }
}
