//! Per-instance override documents
//!
//! An override document is loaded fresh for every launch attempt, edited in
//! memory and serialized into the shared target file. It is never written
//! back to its source file.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use xmltree::{Element, EmitterConfig, XMLNode};

use super::ROOT_ELEMENT;
use super::error::LoadError;

const LEVELS: &str = "Levels";
const LEVEL: &str = "Level";

/// Return the first child element named `name`, appending an empty one if absent
///
/// Calling it repeatedly with the same name always yields the same element.
pub fn child_or_insert<'a>(parent: &'a mut Element, name: &str) -> &'a mut Element {
    let index = match parent
        .children
        .iter()
        .position(|node| node.as_element().is_some_and(|e| e.name == name))
    {
        Some(index) => index,
        None => {
            parent.children.push(XMLNode::Element(Element::new(name)));
            parent.children.len() - 1
        }
    };

    let XMLNode::Element(child) = &mut parent.children[index] else {
        unreachable!("node at {index} is an element named {name}");
    };
    child
}

fn is_level(node: &XMLNode) -> bool {
    node.as_element().is_some_and(|e| e.name == LEVEL)
}

/// In-memory override document rooted at `<Config>`
#[derive(Debug, Clone)]
pub struct OverrideDocument {
    root: Element,
}

impl OverrideDocument {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file), path)
    }

    /// Parse a document; `origin` is only used for error reporting
    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self, LoadError> {
        let root = Element::parse(reader).map_err(|source| LoadError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        if root.name != ROOT_ELEMENT {
            return Err(LoadError::UnexpectedRoot {
                path: origin.to_path_buf(),
                expected: ROOT_ELEMENT,
                found: root.name,
            });
        }

        Ok(Self { root })
    }

    pub fn parse(xml: &str) -> Result<Self, LoadError> {
        Self::from_reader(xml.as_bytes(), &PathBuf::from("<inline>"))
    }

    /// Set the text of `<section><key>`, creating both nodes as needed
    pub fn set_value(&mut self, section: &str, key: &str, value: &str) {
        let node = child_or_insert(child_or_insert(&mut self.root, section), key);
        node.children = vec![XMLNode::Text(value.to_string())];
    }

    /// Text of `<section><key>`, if present
    pub fn value(&self, section: &str, key: &str) -> Option<Cow<'_, str>> {
        self.root.get_child(section)?.get_child(key)?.get_text()
    }

    /// `Level` entries of `<Levels>` in document order
    pub fn levels(&self) -> Vec<&Element> {
        self.root
            .get_child(LEVELS)
            .map(|levels| levels.children.iter().filter_map(|node| node.as_element()).filter(|e| e.name == LEVEL).collect())
            .unwrap_or_default()
    }

    pub fn level_count(&self) -> usize {
        self.levels().len()
    }

    /// Reorder the `Level` entries with `reorder`
    ///
    /// `reorder` reports whether it changed the order. If it did, the levels
    /// are written back after the other children of `<Levels>`, which keep
    /// their relative order; otherwise `<Levels>` is left as it was. Returns
    /// `false` when the document has no `<Levels>`.
    pub fn reorder_levels<F>(&mut self, reorder: F) -> bool
    where
        F: FnOnce(&mut [Element]) -> bool,
    {
        let Some(levels) = self.root.get_mut_child(LEVELS) else {
            return false;
        };

        let mut entries: Vec<Element> = levels
            .children
            .iter()
            .filter(|node| is_level(node))
            .filter_map(|node| node.as_element())
            .cloned()
            .collect();

        if reorder(&mut entries) {
            levels.children.retain(|node| !is_level(node));
            levels.children.extend(entries.into_iter().map(XMLNode::Element));
        }
        true
    }

    /// Serialize with an XML declaration and indentation
    pub fn to_bytes(&self) -> Result<Vec<u8>, xmltree::Error> {
        let mut out = Vec::new();
        self.root
            .write_with_config(&mut out, EmitterConfig::new().perform_indent(true))?;
        Ok(out)
    }
}
