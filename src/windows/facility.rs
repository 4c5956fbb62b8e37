//! [`ProcessFacility`] backed by the Win32 API

use super::bindings::{kernel32, ModuleSnapshot, ProcessSnapshot};
use super::privileges;
use crate::core::types::{Address, ModuleRef, ProcessId, ProcessRef};
use crate::facility::{FacilityResult, ProcessFacility, RawHandle};
use crate::process::handle::ProcessAccess;
use winapi::um::winnt::HANDLE;

/// The local machine's processes, reached through kernel32 and ToolHelp32
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsFacility;

impl WindowsFacility {
    pub fn new() -> Self {
        WindowsFacility
    }
}

fn as_handle(handle: RawHandle) -> HANDLE {
    handle.value() as HANDLE
}

impl ProcessFacility for WindowsFacility {
    fn enumerate_processes(&self) -> FacilityResult<Vec<ProcessRef>> {
        Ok(ProcessSnapshot::new()?.collect())
    }

    fn enumerate_modules(&self, pid: ProcessId) -> FacilityResult<Vec<ModuleRef>> {
        Ok(ModuleSnapshot::new(pid)?.collect())
    }

    fn elevate_privilege(&self) -> FacilityResult<()> {
        privileges::ensure_debug_privilege()
    }

    fn open_process(&self, pid: ProcessId, access: ProcessAccess) -> FacilityResult<RawHandle> {
        let handle = kernel32::open_process(pid, access.value())?;
        Ok(RawHandle::new(handle as usize))
    }

    fn close_handle(&self, handle: RawHandle) -> FacilityResult<()> {
        unsafe { kernel32::close_handle(as_handle(handle))? };
        Ok(())
    }

    fn read_memory(
        &self,
        handle: RawHandle,
        address: Address,
        buffer: &mut [u8],
    ) -> FacilityResult<()> {
        unsafe { kernel32::read_process_memory(as_handle(handle), address.as_usize(), buffer)? };
        Ok(())
    }

    fn write_memory(
        &self,
        handle: RawHandle,
        address: Address,
        data: &[u8],
    ) -> FacilityResult<()> {
        unsafe { kernel32::write_process_memory(as_handle(handle), address.as_usize(), data)? };
        Ok(())
    }
}
