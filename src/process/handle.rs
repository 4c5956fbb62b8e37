//! Session handle owned by the memory access facade

use crate::core::types::ProcessId;
use crate::facility::RawHandle;
use std::fmt;

/// Access rights requested when opening a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessAccess {
    value: u32,
}

impl ProcessAccess {
    /// All possible access rights
    pub const ALL_ACCESS: Self = Self { value: 0x1FFFFF };
    /// Query information access
    pub const QUERY_INFORMATION: Self = Self { value: 0x0400 };
    /// Read memory access
    pub const VM_READ: Self = Self { value: 0x0010 };
    /// Write memory access
    pub const VM_WRITE: Self = Self { value: 0x0020 };
    /// Memory operation access, required alongside VM_WRITE
    pub const VM_OPERATION: Self = Self { value: 0x0008 };

    /// Combine access rights
    pub fn combine(rights: &[Self]) -> Self {
        let mut value = 0;
        for right in rights {
            value |= right.value;
        }
        Self { value }
    }

    /// The narrower mask tried when all-access is denied
    pub fn read_write() -> Self {
        Self::combine(&[
            Self::QUERY_INFORMATION,
            Self::VM_READ,
            Self::VM_WRITE,
            Self::VM_OPERATION,
        ])
    }

    /// Get raw value
    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn contains(&self, other: Self) -> bool {
        self.value & other.value == other.value
    }
}

/// An open connection to a target process.
///
/// Owned by exactly one `MemoryAccess`; the facade releases it.
pub struct SessionHandle {
    raw: RawHandle,
    pid: ProcessId,
    access: ProcessAccess,
}

impl SessionHandle {
    pub(crate) fn new(raw: RawHandle, pid: ProcessId, access: ProcessAccess) -> Self {
        SessionHandle { raw, pid, access }
    }

    /// Get the process ID
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Get the raw facility handle
    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    /// Get the access rights granted at open
    pub fn access(&self) -> ProcessAccess {
        self.access
    }

    /// Check if handle is valid
    pub fn is_valid(&self) -> bool {
        !self.raw.is_null()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("pid", &self.pid)
            .field("valid", &self.is_valid())
            .field("access", &format!("0x{:X}", self.access.value()))
            .finish()
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionHandle(pid={}, valid={})",
            self.pid,
            self.is_valid()
        )
    }
}
