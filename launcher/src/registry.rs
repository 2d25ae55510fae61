//! Instance records and the ordered instance registry

use std::fmt;
use std::sync::Arc;

use crate::store::DedicatedItem;

/// OS-assigned process id of a spawned server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A spawned server process and the descriptor that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub pid: ProcessId,
    pub descriptor: Arc<DedicatedItem>,
}

impl Instance {
    pub fn new(pid: ProcessId, descriptor: Arc<DedicatedItem>) -> Self {
        Self { pid, descriptor }
    }

    /// Override file name identifying this instance's slot
    pub fn file_name(&self) -> &str {
        &self.descriptor.file_name
    }
}

/// Instances in launch order
///
/// Holds at most one entry per successfully launched descriptor; descriptors
/// that failed to launch are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceRegistry {
    instances: Vec<Instance>,
}

impl InstanceRegistry {
    pub fn new(instances: Vec<Instance>) -> Self {
        Self { instances }
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Overwrite every slot whose file name matches `instance`, in place
    ///
    /// Returns how many slots were replaced.
    pub fn replace_by_file_name(&mut self, instance: &Instance) -> usize {
        let mut replaced = 0;
        for slot in self.instances.iter_mut().filter(|slot| slot.file_name() == instance.file_name()) {
            *slot = instance.clone();
            replaced += 1;
        }
        replaced
    }
}

impl From<Vec<Instance>> for InstanceRegistry {
    fn from(instances: Vec<Instance>) -> Self {
        Self::new(instances)
    }
}
