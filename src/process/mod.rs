//! Process resolution and session handles
//!
//! [`ProcessResolver`] turns names into process and module references;
//! [`SessionHandle`] is the open connection the memory access facade owns.

pub mod handle;
pub mod resolver;

pub use handle::{ProcessAccess, SessionHandle};
pub use resolver::ProcessResolver;
