//! Multi-server descriptor parsing

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use xmltree::Element;

use super::ROOT_ELEMENT;
use super::error::ConfigError;

/// Port value meaning "leave the port of the override document alone"
pub const NO_PORT: i32 = -1;

const XML_EXTENSION: &str = ".xml";

/// Append `.xml` to a trimmed file name unless it already ends with it
pub fn normalize_xml_file_name(name: &str) -> String {
    let name = name.trim();
    if name.ends_with(XML_EXTENSION) {
        name.to_string()
    } else {
        format!("{}{}", name, XML_EXTENSION)
    }
}

/// One dedicated server entry of the descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedicatedItem {
    /// Override document file name, always ending in `.xml`
    pub file_name: String,

    /// Game name written to `Plasma/GameName`
    pub game_name: Option<String>,

    /// Port written to `Plasma/Port`; values <= 0 disable the override
    pub port: i32,

    /// Rotate the level list to a random start level
    pub random_start_level: bool,

    /// Shuffle the whole level list (takes precedence over `random_start_level`)
    pub random_level_order: bool,
}

impl DedicatedItem {
    /// Entry with only a file name, no overrides
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: normalize_xml_file_name(file_name),
            game_name: None,
            port: NO_PORT,
            random_start_level: false,
            random_level_order: false,
        }
    }

    /// Port to write, if any
    pub fn port_override(&self) -> Option<i32> {
        (self.port > 0).then_some(self.port)
    }

    /// Game name to write, if non-blank
    pub fn game_name_override(&self) -> Option<&str> {
        self.game_name.as_deref().filter(|name| !name.trim().is_empty())
    }

    fn from_element(element: &Element) -> Option<Self> {
        let file_name = element.attributes.get("FileName").filter(|name| !name.trim().is_empty())?;

        let port = element
            .attributes
            .get("Port")
            .and_then(|port| port.trim().parse::<i32>().ok())
            .unwrap_or(NO_PORT);

        Some(Self {
            file_name: normalize_xml_file_name(file_name),
            game_name: element.attributes.get("GameName").cloned(),
            port,
            random_start_level: is_true(element, "RandomStartLevel"),
            random_level_order: is_true(element, "RandomLevelOrder"),
        })
    }
}

fn is_true(element: &Element, attribute: &str) -> bool {
    element.attributes.get(attribute).is_some_and(|value| value == "true")
}

/// The parsed multi-server descriptor
#[derive(Debug, Clone)]
pub struct MultiServerConfig {
    /// File name of the shared config the server reads at startup
    pub target_file_name: String,

    /// Path of the dedicated server executable
    pub server_file_path: PathBuf,

    /// Raw `LogLevel` attribute
    pub log_level: Option<String>,

    /// Dedicated entries in document order
    pub dedicated: Vec<Arc<DedicatedItem>>,
}

impl MultiServerConfig {
    /// Read and parse the descriptor at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(?path, "MultiServerConfig::load: called");
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse descriptor XML; `path` is only used for error reporting
    pub fn parse(xml: &str, path: &Path) -> Result<Self, ConfigError> {
        let root = Element::parse(xml.as_bytes()).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if root.name != ROOT_ELEMENT {
            return Err(ConfigError::UnexpectedRoot {
                path: path.to_path_buf(),
                expected: ROOT_ELEMENT,
                found: root.name,
            });
        }

        let required = |attribute: &'static str| {
            root.attributes
                .get(attribute)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingAttribute {
                    path: path.to_path_buf(),
                    attribute,
                })
        };

        let target_file_name = normalize_xml_file_name(required("TargetFileName")?);
        let server_file_path = PathBuf::from(required("ServerFilePath")?);

        let dedicated: Vec<Arc<DedicatedItem>> = root
            .children
            .iter()
            .filter_map(|node| node.as_element())
            .filter(|element| element.name == "Dedicated")
            .filter_map(DedicatedItem::from_element)
            .map(Arc::new)
            .collect();

        debug!(
            %target_file_name,
            ?server_file_path,
            count = dedicated.len(),
            "MultiServerConfig::parse: parsed descriptor"
        );

        Ok(Self {
            target_file_name,
            server_file_path,
            log_level: root.attributes.get("LogLevel").cloned(),
            dedicated,
        })
    }
}
