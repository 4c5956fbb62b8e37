//! Raw byte access to a target process through one owned session handle

use crate::config::SessionConfig;
use crate::core::types::{Address, MemoryError, MemoryResult, ProcessRef};
use crate::facility::{FacilityError, ProcessFacility};
use crate::process::handle::{ProcessAccess, SessionHandle};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Options for opening a session
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Attempt privilege elevation before opening
    pub elevate_privilege: bool,
    /// Retry a denied all-access open with the read/write mask
    pub fallback_access: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            elevate_privilege: true,
            fallback_access: true,
        }
    }
}

impl From<&SessionConfig> for OpenOptions {
    fn from(config: &SessionConfig) -> Self {
        OpenOptions {
            elevate_privilege: config.elevate_privilege,
            fallback_access: config.fallback_access,
        }
    }
}

/// Byte-granular, all-or-nothing access to one process.
///
/// Owns exactly one session handle, released once on `close`, `reopen` or drop.
pub struct MemoryAccess<F: ProcessFacility> {
    facility: Arc<F>,
    process: ProcessRef,
    handle: Option<SessionHandle>,
    elevated: bool,
    options: OpenOptions,
}

impl<F: ProcessFacility> MemoryAccess<F> {
    /// Open a session with default options
    pub fn open(facility: Arc<F>, process: ProcessRef) -> MemoryResult<Self> {
        Self::open_with(facility, process, OpenOptions::default())
    }

    /// Elevate (if requested, best-effort) then open the process
    pub fn open_with(
        facility: Arc<F>,
        process: ProcessRef,
        options: OpenOptions,
    ) -> MemoryResult<Self> {
        let elevated = options.elevate_privilege && elevate(facility.as_ref());
        let handle = open_handle(facility.as_ref(), &process, &options)?;

        info!(
            process = %process,
            access = format_args!("0x{:X}", handle.access().value()),
            elevated,
            "session opened"
        );

        Ok(MemoryAccess {
            facility,
            process,
            handle: Some(handle),
            elevated,
            options,
        })
    }

    /// Whether the last privilege elevation attempt succeeded
    pub fn elevated(&self) -> bool {
        self.elevated
    }

    pub fn process(&self) -> &ProcessRef {
        &self.process
    }

    pub fn handle(&self) -> Option<&SessionHandle> {
        self.handle.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.handle.as_ref().map_or(false, SessionHandle::is_valid)
    }

    fn live_handle(&self) -> MemoryResult<&SessionHandle> {
        self.handle
            .as_ref()
            .filter(|h| h.is_valid())
            .ok_or(MemoryError::NoHandle(self.process.pid))
    }

    /// Read exactly `size` bytes at `address`
    pub fn read_bytes(&self, address: Address, size: usize) -> MemoryResult<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        self.read_into(address, &mut buffer)?;
        Ok(buffer)
    }

    /// Read a fixed number of bytes at `address`
    pub fn read_exact<const N: usize>(&self, address: Address) -> MemoryResult<[u8; N]> {
        let mut buffer = [0u8; N];
        self.read_into(address, &mut buffer)?;
        Ok(buffer)
    }

    fn read_into(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
        let handle = self.live_handle()?;
        if buffer.is_empty() {
            return Ok(());
        }

        self.facility
            .read_memory(handle.raw(), address, buffer)
            .map_err(|e| MemoryError::read_failed(address, e.to_string()))
    }

    /// Write all of `data` at `address`
    pub fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        let handle = self.live_handle()?;
        if data.is_empty() {
            return Ok(());
        }

        self.facility
            .write_memory(handle.raw(), address, data)
            .map_err(|e| MemoryError::write_failed(address, e.to_string()))
    }

    /// Release the session handle. Calling it again does nothing.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            match self.facility.close_handle(handle.raw()) {
                Ok(()) => debug!(process = %self.process, "session closed"),
                Err(e) => warn!(process = %self.process, error = %e, "failed to close session handle"),
            }
        }
    }

    /// Replace the session with a fresh one to `process`.
    ///
    /// The old handle is released first; if the new open fails the facade
    /// is left without a handle.
    pub fn reopen(&mut self, process: ProcessRef) -> MemoryResult<()> {
        self.close();
        self.process = process;
        self.elevated = self.options.elevate_privilege && elevate(self.facility.as_ref());
        self.handle = Some(open_handle(
            self.facility.as_ref(),
            &self.process,
            &self.options,
        )?);
        Ok(())
    }
}

impl<F: ProcessFacility> Drop for MemoryAccess<F> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<F: ProcessFacility> fmt::Debug for MemoryAccess<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAccess")
            .field("process", &self.process)
            .field("handle", &self.handle)
            .field("elevated", &self.elevated)
            .finish()
    }
}

fn elevate<F: ProcessFacility>(facility: &F) -> bool {
    match facility.elevate_privilege() {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "privilege elevation failed, continuing without it");
            false
        }
    }
}

fn open_handle<F: ProcessFacility>(
    facility: &F,
    process: &ProcessRef,
    options: &OpenOptions,
) -> MemoryResult<SessionHandle> {
    let pid = process.pid;
    let access = match facility.open_process(pid, ProcessAccess::ALL_ACCESS) {
        Ok(raw) => Ok((raw, ProcessAccess::ALL_ACCESS)),
        Err(e) if e.is_access_denied() && options.fallback_access => {
            debug!(process = %process, error = %e, "all-access open denied, retrying read/write");
            let narrow = ProcessAccess::read_write();
            facility.open_process(pid, narrow).map(|raw| (raw, narrow))
        }
        Err(e) => Err(e),
    };

    let (raw, granted) = access.map_err(|e| open_error(pid, e))?;
    if raw.is_null() {
        return Err(MemoryError::handle_open_failed(pid, "facility returned a null handle"));
    }
    Ok(SessionHandle::new(raw, pid, granted))
}

fn open_error(pid: u32, error: FacilityError) -> MemoryError {
    if error.is_access_denied() {
        MemoryError::privilege_denied(pid, error.to_string())
    } else {
        MemoryError::handle_open_failed(pid, error.to_string())
    }
}
