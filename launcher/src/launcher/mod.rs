//! LaunchCoordinator: merges a dedicated entry into its override document,
//! writes the shared target file and spawns the server
//!
//! Launches are strictly sequential with a fixed delay after each spawn,
//! see [`LaunchCoordinator`].

mod coordinator;
mod error;
mod randomize;
mod spawn;

pub use coordinator::{LaunchCoordinator, apply_overrides};
pub use error::LaunchError;
pub use randomize::{LevelRandomization, rotate_start_level, shuffle_levels};
pub use spawn::{ProcessSpawner, SystemSpawner};
