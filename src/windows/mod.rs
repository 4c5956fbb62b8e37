//! Windows API layer
//!
//! Implements [`crate::facility::ProcessFacility`] on top of kernel32 and
//! ToolHelp32. All unsafe FFI calls are contained within this module.

pub mod bindings;
pub mod facility;
pub mod privileges;
pub mod types;
pub mod utils;

pub use facility::WindowsFacility;
pub use types::Handle;
pub use utils::{ErrorCode, WinError};
