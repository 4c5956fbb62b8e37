//! Core module containing fundamental types for rwmem
//!
//! This module provides the foundational building blocks used throughout
//! the crate: address handling, typed values, process/module references
//! and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address, MemoryError, MemoryResult, ModuleRef, ProcessId, ProcessRef, TypedValue, ValueKind,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
