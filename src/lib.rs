//! rwmem: typed reads and writes of another process's memory
//!
//! A process is found by exact name, a session is opened to it, and values
//! are moved in and out as [`TypedValue`]s through [`ProcessMemory`]. The
//! operating system is reached only through [`facility::ProcessFacility`];
//! on Windows that is [`windows::WindowsFacility`], and
//! [`facility::SimulatedFacility`] stands in everywhere else.
//!
//! ```
//! use rwmem::{Address, ProcessMemory, SimulatedFacility, TypedValue, ValueKind};
//! use std::sync::Arc;
//!
//! let facility = Arc::new(
//!     SimulatedFacility::new()
//!         .with_process("game.exe", 1234)
//!         .with_zeroed(1234, 0x1000, 4),
//! );
//! let memory = ProcessMemory::attach(facility, "game.exe");
//! assert!(memory.is_open());
//!
//! memory.write(Address::new(0x1000), &TypedValue::Signed32(-5)).unwrap();
//! let value = memory.read(Address::new(0x1000), 0, ValueKind::Signed32).unwrap();
//! assert_eq!(value, TypedValue::Signed32(-5));
//! ```

pub mod config;
pub mod core;
pub mod facility;
pub mod memory;
pub mod process;
#[cfg(windows)]
pub mod windows;

// Re-export main types from core module
pub use crate::core::types::{
    parse_address, Address, MemoryError, MemoryResult, ModuleRef, ProcessId, ProcessRef,
    TypedValue, ValueKind,
};

pub use config::{Config, ConfigError};
pub use facility::{FacilityError, ProcessFacility, RawHandle, SimulatedFacility};
pub use memory::{MemoryAccess, OpenOptions, ProcessMemory};
pub use process::{ProcessAccess, ProcessResolver, SessionHandle};

#[cfg(windows)]
pub use windows::WindowsFacility;
