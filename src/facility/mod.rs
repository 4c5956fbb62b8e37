//! OS access facility boundary
//!
//! The core never calls the operating system directly. Everything it needs
//! (process and module listing, privilege elevation, handle open/close and
//! raw memory transfer) goes through [`ProcessFacility`]. The Windows
//! implementation lives in `crate::windows`; [`simulated::SimulatedFacility`]
//! backs the tests.

pub mod simulated;

pub use simulated::SimulatedFacility;

use crate::core::types::{Address, ModuleRef, ProcessId, ProcessRef};
use crate::process::handle::ProcessAccess;
use std::fmt;
use thiserror::Error;

/// Failure reported by a facility primitive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FacilityError {
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("{context} (os error {code})")]
    Os { context: String, code: u32 },

    #[error("{0}")]
    Unavailable(String),
}

impl FacilityError {
    pub fn os(context: impl Into<String>, code: u32) -> Self {
        FacilityError::Os {
            context: context.into(),
            code,
        }
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, FacilityError::AccessDenied(_))
    }
}

pub type FacilityResult<T> = Result<T, FacilityError>;

/// Opaque handle value issued by a facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(usize);

impl RawHandle {
    pub const fn new(value: usize) -> Self {
        RawHandle(value)
    }

    pub const fn null() -> Self {
        RawHandle(0)
    }

    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    pub const fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// Primitives the core consumes from the host OS.
///
/// Reads and writes are all-or-nothing: an implementation must either move
/// every requested byte or return an error.
pub trait ProcessFacility: Send + Sync {
    /// Snapshot of running processes, in the OS's own order
    fn enumerate_processes(&self) -> FacilityResult<Vec<ProcessRef>>;

    /// Snapshot of the modules loaded in `pid`
    fn enumerate_modules(&self, pid: ProcessId) -> FacilityResult<Vec<ModuleRef>>;

    /// Best-effort elevation of the calling process's own privileges
    fn elevate_privilege(&self) -> FacilityResult<()>;

    fn open_process(&self, pid: ProcessId, access: ProcessAccess) -> FacilityResult<RawHandle>;

    fn close_handle(&self, handle: RawHandle) -> FacilityResult<()>;

    /// Fill `buffer` from `address` in the target
    fn read_memory(
        &self,
        handle: RawHandle,
        address: Address,
        buffer: &mut [u8],
    ) -> FacilityResult<()>;

    fn write_memory(&self, handle: RawHandle, address: Address, data: &[u8])
        -> FacilityResult<()>;
}
