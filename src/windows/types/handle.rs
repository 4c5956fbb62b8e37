//! Owned HANDLE with automatic cleanup

use std::ptr;
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::winnt::HANDLE;

/// Owned Windows HANDLE, closed on drop.
///
/// Used for snapshots and tokens; process handles handed out through the
/// facility are tracked by the session instead.
pub struct Handle {
    handle: HANDLE,
}

impl Handle {
    pub fn new(handle: HANDLE) -> Self {
        Handle { handle }
    }

    pub fn null() -> Self {
        Handle {
            handle: ptr::null_mut(),
        }
    }

    /// Null or `INVALID_HANDLE_VALUE`
    pub fn is_invalid(&self) -> bool {
        self.handle.is_null() || self.handle == INVALID_HANDLE_VALUE
    }

    pub fn raw(&self) -> HANDLE {
        self.handle
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.is_invalid() {
            unsafe {
                CloseHandle(self.handle);
            }
        }
    }
}

// HANDLE values are process-wide
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_handles() {
        assert!(Handle::null().is_invalid());
        assert!(Handle::new(INVALID_HANDLE_VALUE).is_invalid());
        assert_eq!(Handle::null().raw(), ptr::null_mut());
    }
}
