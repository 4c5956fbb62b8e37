//! Process and module references

use super::{Address, ProcessId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A running process, as reported by the facility's process listing.
///
/// Not kept alive: if the process exits, the next access through a session fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessRef {
    pub name: String,
    pub pid: ProcessId,
}

impl ProcessRef {
    pub fn new(name: impl Into<String>, pid: ProcessId) -> Self {
        ProcessRef {
            name: name.into(),
            pid,
        }
    }

    /// Exact, case-sensitive name comparison
    pub fn name_matches(&self, name: &str) -> bool {
        self.name == name
    }
}

impl fmt::Display for ProcessRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pid {})", self.name, self.pid)
    }
}

/// A module mapped into a process
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleRef {
    pub name: String,
    pub base_address: Address,
    /// Image size in bytes, 0 when the facility does not report it
    pub size: usize,
}

impl ModuleRef {
    pub fn new(name: impl Into<String>, base_address: Address, size: usize) -> Self {
        ModuleRef {
            name: name.into(),
            base_address,
            size,
        }
    }

    /// Gets the end address of the module
    pub fn end_address(&self) -> Address {
        self.base_address.wrapping_add(self.size)
    }

    /// Checks if an address is within this module
    pub fn contains_address(&self, address: Address) -> bool {
        address >= self.base_address && address < self.end_address()
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.name == name
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.name, self.base_address)
    }
}
