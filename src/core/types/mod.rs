//! Core type definitions for rwmem
//!
//! Address wrapper, typed values, process/module references and error types.

mod address;
mod error;
mod process_info;
mod value;

// Re-export all public types
pub use address::{parse_address, Address};
pub use error::{MemoryError, MemoryResult};
pub use process_info::{ModuleRef, ProcessRef};
pub use value::{TypedValue, ValueKind};

// Common type aliases
pub type ProcessId = u32;
