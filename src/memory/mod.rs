//! Memory operations on a target process
//!
//! - [`MemoryAccess`]: raw, all-or-nothing byte transfer over one session
//! - [`ProcessMemory`]: typed values on top of it, plus module lookup

pub mod access;
pub mod marshal;

pub use access::{MemoryAccess, OpenOptions};
pub use marshal::ProcessMemory;

#[cfg(windows)]
impl ProcessMemory<crate::windows::WindowsFacility> {
    /// Attach to a process on the local machine
    pub fn attach_local(name: &str) -> Self {
        Self::attach(std::sync::Arc::new(crate::windows::WindowsFacility::new()), name)
    }
}
