//! ConfigStore: the multi-server descriptor and per-instance override documents
//!
//! The descriptor (`MultiDedicated.xml`) lists the dedicated servers to run.
//! Each entry names an override document which is merged into the shared
//! target file right before its server is spawned.

mod descriptor;
mod document;
mod error;

use std::path::Path;

pub use descriptor::{DedicatedItem, MultiServerConfig, NO_PORT, normalize_xml_file_name};
pub use document::{OverrideDocument, child_or_insert};
pub use error::{ConfigError, LoadError};

/// Root element name shared by the descriptor and the override documents
pub const ROOT_ELEMENT: &str = "Config";

/// Load the multi-server descriptor
pub fn load_top_level(path: &Path) -> Result<MultiServerConfig, ConfigError> {
    MultiServerConfig::load(path)
}

/// Load one override document
pub fn load_override_document(path: &Path) -> Result<OverrideDocument, LoadError> {
    OverrideDocument::load(path)
}
