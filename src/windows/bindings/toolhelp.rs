//! Process and module snapshots through the ToolHelp32 API

use crate::core::types::{Address, ModuleRef, ProcessId, ProcessRef};
use crate::windows::types::Handle;
use crate::windows::utils::{wide_to_string, ErrorCode, WinError};
use std::mem;
use winapi::shared::minwindef::FALSE;
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Module32FirstW, Module32NextW, Process32FirstW, Process32NextW,
    MODULEENTRY32W, PROCESSENTRY32W, TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32, TH32CS_SNAPPROCESS,
};

/// Module snapshots can fail transiently with `ERROR_BAD_LENGTH` while the
/// target is loading modules
const SNAPSHOT_RETRIES: usize = 8;

fn snapshot(flags: u32, pid: ProcessId, context: &str) -> Result<Handle, WinError> {
    let mut attempt = 0;
    loop {
        let handle = Handle::new(unsafe { CreateToolhelp32Snapshot(flags, pid) });
        if !handle.is_invalid() {
            return Ok(handle);
        }

        let err = WinError::new(context.to_string());
        attempt += 1;
        if err.code() != ErrorCode::BadLength || attempt >= SNAPSHOT_RETRIES {
            return Err(err);
        }
    }
}

/// Iterator over running processes, in snapshot order
pub struct ProcessSnapshot {
    snapshot: Handle,
    first_called: bool,
}

impl ProcessSnapshot {
    pub fn new() -> Result<Self, WinError> {
        Ok(ProcessSnapshot {
            snapshot: snapshot(TH32CS_SNAPPROCESS, 0, "CreateToolhelp32Snapshot(processes)")?,
            first_called: false,
        })
    }
}

impl Iterator for ProcessSnapshot {
    type Item = ProcessRef;

    fn next(&mut self) -> Option<Self::Item> {
        unsafe {
            let mut entry: PROCESSENTRY32W = mem::zeroed();
            entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

            let success = if !self.first_called {
                self.first_called = true;
                Process32FirstW(self.snapshot.raw(), &mut entry)
            } else {
                Process32NextW(self.snapshot.raw(), &mut entry)
            };

            if success == FALSE {
                return None;
            }

            Some(ProcessRef::new(
                wide_to_string(&entry.szExeFile),
                entry.th32ProcessID,
            ))
        }
    }
}

/// Iterator over the modules of one process, 32- and 64-bit alike
pub struct ModuleSnapshot {
    snapshot: Handle,
    first_called: bool,
}

impl ModuleSnapshot {
    pub fn new(pid: ProcessId) -> Result<Self, WinError> {
        let context = format!("CreateToolhelp32Snapshot(modules of pid {})", pid);
        Ok(ModuleSnapshot {
            snapshot: snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid, &context)?,
            first_called: false,
        })
    }
}

impl Iterator for ModuleSnapshot {
    type Item = ModuleRef;

    fn next(&mut self) -> Option<Self::Item> {
        unsafe {
            let mut entry: MODULEENTRY32W = mem::zeroed();
            entry.dwSize = mem::size_of::<MODULEENTRY32W>() as u32;

            let success = if !self.first_called {
                self.first_called = true;
                Module32FirstW(self.snapshot.raw(), &mut entry)
            } else {
                Module32NextW(self.snapshot.raw(), &mut entry)
            };

            if success == FALSE {
                return None;
            }

            Some(ModuleRef::new(
                wide_to_string(&entry.szModule),
                Address::new(entry.modBaseAddr as usize),
                entry.modBaseSize as usize,
            ))
        }
    }
}
