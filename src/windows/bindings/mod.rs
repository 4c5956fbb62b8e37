//! Low-level FFI wrappers around Windows system libraries

pub mod kernel32;
pub mod toolhelp;

pub use toolhelp::{ModuleSnapshot, ProcessSnapshot};
