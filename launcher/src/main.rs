//! Conquest Launcher - runs and supervises several dedicated servers
//!
//! No command-line flags: everything comes from the multi-server descriptor
//! in the server's documents directory.

use std::env;
use std::process;

use eyre::{Context, Result};
use tracing::{debug, error, info, warn};

use conquest_launcher::config::Config;
use conquest_launcher::launcher::{LaunchCoordinator, SystemSpawner};
use conquest_launcher::logging::{FATAL, Logging};
use conquest_launcher::monitor::{ProcessMonitor, SystemProcessTable};
use conquest_launcher::store;
use conquest_launcher::supervisor::Supervisor;

/// Log a fatal line and terminate
fn fatal(message: &str) -> ! {
    error!(target: FATAL, "{}", message);
    process::exit(1);
}

fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let logging = Logging::init(&config.log_path()).context("Failed to setup logging")?;
    debug!(
        log_path = %logging.log_path().display(),
        file_enabled = logging.file_enabled(),
        "Logging initialized"
    );

    let descriptor_path = config.descriptor_path();
    let descriptor = match store::load_top_level(&descriptor_path) {
        Ok(descriptor) => descriptor,
        Err(e) => fatal(&format!(
            "Failed to read multi server config file at '{}': {}",
            descriptor_path.display(),
            e
        )),
    };

    if let Some(level) = descriptor.log_level.as_deref() {
        info!("Setting log level to {}", level);
        logging.apply_level_name(level)?;
    }

    info!("Started conquest-launcher");
    match env::current_dir() {
        Ok(dir) => info!("Current directory: '{}'", dir.display()),
        Err(e) => warn!("Failed to determine current directory: {}", e),
    }

    let launcher = LaunchCoordinator::new(&config, &descriptor, SystemSpawner::new());

    debug!("Setting current directory");
    if let Err(e) = launcher.set_working_directory() {
        fatal(&format!("Failed to change into the server directory: {}", e));
    }

    let monitor = ProcessMonitor::new(config.server_process_name.clone(), SystemProcessTable::new());
    let supervisor = Supervisor::start(launcher, monitor, config.down_check_interval());

    if supervisor.registry().is_empty() && !descriptor.dedicated.is_empty() {
        warn!(
            "None of the {} configured servers could be launched, check the dedicated files in {}",
            descriptor.dedicated.len(),
            config.server_dir.display()
        );
    }

    supervisor.run()
}
