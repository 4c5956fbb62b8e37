//! Token privilege elevation for cross-process memory access

use crate::facility::{FacilityError, FacilityResult};
use crate::windows::types::Handle;
use crate::windows::utils::{string_to_wide, ErrorCode, WinError};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;
use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::um::processthreadsapi::{GetCurrentProcess, OpenProcessToken};
use winapi::um::securitybaseapi::AdjustTokenPrivileges;
use winapi::um::winbase::LookupPrivilegeValueW;
use winapi::um::winnt::{
    HANDLE, LUID, LUID_AND_ATTRIBUTES, SE_PRIVILEGE_ENABLED, TOKEN_ADJUST_PRIVILEGES,
    TOKEN_PRIVILEGES, TOKEN_QUERY,
};

pub const SE_DEBUG_PRIVILEGE: &str = "SeDebugPrivilege";

lazy_static::lazy_static! {
    /// Outcome of the first elevation attempt per privilege name
    static ref ELEVATED_PRIVILEGES: Mutex<HashMap<String, FacilityResult<()>>> =
        Mutex::new(HashMap::new());
}

/// Enable `SeDebugPrivilege` once per process
pub fn ensure_debug_privilege() -> FacilityResult<()> {
    ensure_privilege(SE_DEBUG_PRIVILEGE)
}

/// Enable `privilege_name` on the current process token.
///
/// Only the first call touches the token; later calls return the recorded
/// outcome.
pub fn ensure_privilege(privilege_name: &str) -> FacilityResult<()> {
    let mut cache = ELEVATED_PRIVILEGES
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if let Some(outcome) = cache.get(privilege_name) {
        return outcome.clone();
    }

    let outcome = unsafe { enable_privilege(privilege_name) }.map_err(FacilityError::from);
    debug!(privilege = privilege_name, ok = outcome.is_ok(), "token privilege adjusted");
    cache.insert(privilege_name.to_string(), outcome.clone());
    outcome
}

unsafe fn enable_privilege(privilege_name: &str) -> Result<(), WinError> {
    let mut raw_token: HANDLE = std::ptr::null_mut();
    if OpenProcessToken(
        GetCurrentProcess(),
        TOKEN_ADJUST_PRIVILEGES | TOKEN_QUERY,
        &mut raw_token,
    ) == FALSE
    {
        return Err(WinError::new("OpenProcessToken"));
    }
    let token = Handle::new(raw_token);

    let mut luid = LUID {
        LowPart: 0,
        HighPart: 0,
    };
    let wide_name = string_to_wide(privilege_name);
    if LookupPrivilegeValueW(std::ptr::null(), wide_name.as_ptr(), &mut luid) == FALSE {
        return Err(WinError::new(format!("LookupPrivilegeValueW({})", privilege_name)));
    }

    let mut privileges = TOKEN_PRIVILEGES {
        PrivilegeCount: 1,
        Privileges: [LUID_AND_ATTRIBUTES {
            Luid: luid,
            Attributes: SE_PRIVILEGE_ENABLED,
        }],
    };

    if AdjustTokenPrivileges(
        token.raw(),
        FALSE,
        &mut privileges,
        std::mem::size_of::<TOKEN_PRIVILEGES>() as DWORD,
        std::ptr::null_mut(),
        std::ptr::null_mut(),
    ) == FALSE
    {
        return Err(WinError::new(format!("AdjustTokenPrivileges({})", privilege_name)));
    }

    // AdjustTokenPrivileges succeeds even when the token lacks the privilege
    let last = ErrorCode::last_error();
    if last == ErrorCode::NotAllAssigned {
        return Err(WinError::with_code(
            ErrorCode::AccessDenied,
            format!("{} is not held by this token", privilege_name),
        ));
    }

    Ok(())
}
