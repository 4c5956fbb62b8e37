//! Kernel32.dll bindings for process handles and memory transfer

use crate::windows::utils::{ErrorCode, WinError};
use winapi::shared::minwindef::{FALSE, LPCVOID, LPVOID};
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{ReadProcessMemory, WriteProcessMemory};
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::winnt::HANDLE;

/// Safe wrapper for OpenProcess
pub fn open_process(pid: u32, desired_access: u32) -> Result<HANDLE, WinError> {
    let handle = unsafe { OpenProcess(desired_access, FALSE, pid) };
    if handle.is_null() {
        Err(WinError::new(format!(
            "OpenProcess(pid {}, access 0x{:X})",
            pid, desired_access
        )))
    } else {
        Ok(handle)
    }
}

/// Safe wrapper for CloseHandle
///
/// # Safety
/// The handle must be a valid Windows handle not closed elsewhere
pub unsafe fn close_handle(handle: HANDLE) -> Result<(), WinError> {
    if CloseHandle(handle) == FALSE {
        Err(WinError::new("CloseHandle"))
    } else {
        Ok(())
    }
}

/// Fill `buffer` from `address`; a short read is reported as a partial copy
///
/// # Safety
/// The handle must be a valid process handle with read access
pub unsafe fn read_process_memory(
    handle: HANDLE,
    address: usize,
    buffer: &mut [u8],
) -> Result<(), WinError> {
    let mut bytes_read = 0;

    let result = ReadProcessMemory(
        handle,
        address as LPCVOID,
        buffer.as_mut_ptr() as LPVOID,
        buffer.len(),
        &mut bytes_read,
    );

    let context = || format!("ReadProcessMemory({} bytes at 0x{:X})", buffer.len(), address);
    if result == FALSE {
        Err(WinError::new(context()))
    } else if bytes_read != buffer.len() {
        Err(WinError::with_code(ErrorCode::PartialCopy, context()))
    } else {
        Ok(())
    }
}

/// Write all of `data` at `address`; a short write is reported as a partial copy
///
/// # Safety
/// The handle must be a valid process handle with write access
pub unsafe fn write_process_memory(
    handle: HANDLE,
    address: usize,
    data: &[u8],
) -> Result<(), WinError> {
    let mut bytes_written = 0;

    let result = WriteProcessMemory(
        handle,
        address as LPVOID,
        data.as_ptr() as LPCVOID,
        data.len(),
        &mut bytes_written,
    );

    let context = || format!("WriteProcessMemory({} bytes at 0x{:X})", data.len(), address);
    if result == FALSE {
        Err(WinError::new(context()))
    } else if bytes_written != data.len() {
        Err(WinError::with_code(ErrorCode::PartialCopy, context()))
    } else {
        Ok(())
    }
}
