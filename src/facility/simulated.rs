//! In-memory facility standing in for the OS
//!
//! Holds a process list, per-process module lists and a sparse byte map per
//! process. Failures are injected explicitly, and every primitive call is
//! counted so callers can assert that nothing reached the facility.

use super::{FacilityError, FacilityResult, ProcessFacility, RawHandle};
use crate::core::types::{Address, ModuleRef, ProcessId, ProcessRef};
use crate::process::handle::ProcessAccess;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

const ERROR_INVALID_HANDLE: u32 = 6;
const ERROR_INVALID_PARAMETER: u32 = 87;
const ERROR_PARTIAL_COPY: u32 = 299;

#[derive(Default)]
struct SimMemory {
    bytes: BTreeMap<usize, u8>,
    inaccessible: Vec<Range<usize>>,
}

impl SimMemory {
    fn accessible(&self, address: usize) -> bool {
        self.bytes.contains_key(&address) && !self.inaccessible.iter().any(|r| r.contains(&address))
    }

    /// Every address of the range, or `None` if any byte is unavailable
    fn span(&self, address: Address, len: usize) -> Option<Vec<usize>> {
        (0..len)
            .map(|i| {
                address
                    .checked_add(i)
                    .map(|a| a.as_usize())
                    .filter(|a| self.accessible(*a))
            })
            .collect()
    }
}

#[derive(Default)]
struct SimState {
    processes: Vec<ProcessRef>,
    modules: HashMap<ProcessId, Vec<ModuleRef>>,
    memory: HashMap<ProcessId, SimMemory>,
    open_handles: HashMap<RawHandle, ProcessId>,
    next_handle: usize,
    opened: usize,
    closed: usize,
    fail_process_enumeration: bool,
    fail_module_enumeration: bool,
    deny_privilege: bool,
    deny_all_access: HashSet<ProcessId>,
    deny_open: HashSet<ProcessId>,
    fail_open: HashSet<ProcessId>,
}

/// A [`ProcessFacility`] backed entirely by memory.
#[derive(Default)]
pub struct SimulatedFacility {
    state: Mutex<SimState>,
    calls: AtomicUsize,
    privilege_requests: AtomicUsize,
}

impl SimulatedFacility {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Adds a process to the listing, after any existing ones
    pub fn with_process(self, name: &str, pid: ProcessId) -> Self {
        {
            let mut state = self.state();
            state.processes.push(ProcessRef::new(name, pid));
            state.memory.entry(pid).or_default();
        }
        self
    }

    pub fn with_module(self, pid: ProcessId, name: &str, base: usize, size: usize) -> Self {
        self.state()
            .modules
            .entry(pid)
            .or_default()
            .push(ModuleRef::new(name, Address::new(base), size));
        self
    }

    /// Maps `bytes` at `base` in the process's address space
    pub fn with_region(self, pid: ProcessId, base: usize, bytes: &[u8]) -> Self {
        self.map_region(pid, base, bytes);
        self
    }

    /// Maps `len` zero bytes at `base`
    pub fn with_zeroed(self, pid: ProcessId, base: usize, len: usize) -> Self {
        self.map_region(pid, base, &vec![0u8; len]);
        self
    }

    /// Marks `[base, base + len)` as unreadable and unwritable
    pub fn with_inaccessible(self, pid: ProcessId, base: usize, len: usize) -> Self {
        self.state()
            .memory
            .entry(pid)
            .or_default()
            .inaccessible
            .push(base..base.saturating_add(len));
        self
    }

    pub fn failing_process_enumeration(self) -> Self {
        self.state().fail_process_enumeration = true;
        self
    }

    pub fn failing_module_enumeration(self) -> Self {
        self.state().fail_module_enumeration = true;
        self
    }

    pub fn denying_privilege(self) -> Self {
        self.state().deny_privilege = true;
        self
    }

    /// All-access opens of `pid` are denied; narrower masks still succeed
    pub fn denying_all_access(self, pid: ProcessId) -> Self {
        self.state().deny_all_access.insert(pid);
        self
    }

    /// Every open of `pid` is denied
    pub fn denying_open(self, pid: ProcessId) -> Self {
        self.state().deny_open.insert(pid);
        self
    }

    /// Every open of `pid` fails with a non-permission OS error
    pub fn failing_open(self, pid: ProcessId) -> Self {
        self.state().fail_open.insert(pid);
        self
    }

    /// Bytes that would land past `usize::MAX` are dropped
    pub fn map_region(&self, pid: ProcessId, base: usize, bytes: &[u8]) {
        let mut state = self.state();
        let memory = state.memory.entry(pid).or_default();
        for (address, byte) in (base..=usize::MAX).zip(bytes) {
            memory.bytes.insert(address, *byte);
        }
    }

    /// Removes the process, its modules and its memory; handles stay issued
    pub fn exit_process(&self, pid: ProcessId) {
        let mut state = self.state();
        state.processes.retain(|p| p.pid != pid);
        state.modules.remove(&pid);
        state.memory.remove(&pid);
    }

    /// Reads mapped bytes directly, bypassing handles and call counting
    pub fn peek(&self, pid: ProcessId, base: usize, len: usize) -> Option<Vec<u8>> {
        let state = self.state();
        let memory = state.memory.get(&pid)?;
        (0..len)
            .map(|i| {
                base.checked_add(i)
                    .and_then(|address| memory.bytes.get(&address).copied())
            })
            .collect()
    }

    /// Number of facility primitives invoked so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn privilege_requests(&self) -> usize {
        self.privilege_requests.load(Ordering::SeqCst)
    }

    pub fn open_handle_count(&self) -> usize {
        self.state().open_handles.len()
    }

    pub fn opened_count(&self) -> usize {
        self.state().opened
    }

    pub fn closed_count(&self) -> usize {
        self.state().closed
    }
}

impl ProcessFacility for SimulatedFacility {
    fn enumerate_processes(&self) -> FacilityResult<Vec<ProcessRef>> {
        self.count();
        let state = self.state();
        if state.fail_process_enumeration {
            return Err(FacilityError::AccessDenied(
                "process snapshot refused".to_string(),
            ));
        }
        Ok(state.processes.clone())
    }

    fn enumerate_modules(&self, pid: ProcessId) -> FacilityResult<Vec<ModuleRef>> {
        self.count();
        let state = self.state();
        if state.fail_module_enumeration {
            return Err(FacilityError::AccessDenied(
                "module snapshot refused".to_string(),
            ));
        }
        if !state.processes.iter().any(|p| p.pid == pid) {
            return Err(FacilityError::os(
                format!("no process with pid {}", pid),
                ERROR_INVALID_PARAMETER,
            ));
        }
        Ok(state.modules.get(&pid).cloned().unwrap_or_default())
    }

    fn elevate_privilege(&self) -> FacilityResult<()> {
        self.count();
        self.privilege_requests.fetch_add(1, Ordering::SeqCst);
        if self.state().deny_privilege {
            return Err(FacilityError::AccessDenied(
                "SeDebugPrivilege not held".to_string(),
            ));
        }
        Ok(())
    }

    fn open_process(&self, pid: ProcessId, access: ProcessAccess) -> FacilityResult<RawHandle> {
        self.count();
        let mut state = self.state();
        if !state.processes.iter().any(|p| p.pid == pid) {
            return Err(FacilityError::os(
                format!("no process with pid {}", pid),
                ERROR_INVALID_PARAMETER,
            ));
        }
        if state.fail_open.contains(&pid) {
            return Err(FacilityError::os(
                format!("OpenProcess failed for pid {}", pid),
                ERROR_INVALID_PARAMETER,
            ));
        }
        if state.deny_open.contains(&pid)
            || (state.deny_all_access.contains(&pid) && access == ProcessAccess::ALL_ACCESS)
        {
            return Err(FacilityError::AccessDenied(format!(
                "OpenProcess(0x{:X}) for pid {}",
                access.value(),
                pid
            )));
        }

        state.next_handle += 4;
        let handle = RawHandle::new(0x100 + state.next_handle);
        state.open_handles.insert(handle, pid);
        state.opened += 1;
        Ok(handle)
    }

    fn close_handle(&self, handle: RawHandle) -> FacilityResult<()> {
        self.count();
        let mut state = self.state();
        match state.open_handles.remove(&handle) {
            Some(_) => {
                state.closed += 1;
                Ok(())
            }
            None => Err(FacilityError::os(
                format!("handle {} is not open", handle),
                ERROR_INVALID_HANDLE,
            )),
        }
    }

    fn read_memory(
        &self,
        handle: RawHandle,
        address: Address,
        buffer: &mut [u8],
    ) -> FacilityResult<()> {
        self.count();
        let state = self.state();
        let pid = *state.open_handles.get(&handle).ok_or_else(|| {
            FacilityError::os(format!("handle {} is not open", handle), ERROR_INVALID_HANDLE)
        })?;
        let span = state
            .memory
            .get(&pid)
            .and_then(|memory| memory.span(address, buffer.len()).map(|span| (memory, span)));

        match span {
            Some((memory, span)) => {
                for (slot, addr) in buffer.iter_mut().zip(span) {
                    *slot = memory.bytes[&addr];
                }
                Ok(())
            }
            None => Err(FacilityError::os(
                format!("read of {} bytes at {} crosses unreadable memory", buffer.len(), address),
                ERROR_PARTIAL_COPY,
            )),
        }
    }

    fn write_memory(
        &self,
        handle: RawHandle,
        address: Address,
        data: &[u8],
    ) -> FacilityResult<()> {
        self.count();
        let mut state = self.state();
        let pid = *state.open_handles.get(&handle).ok_or_else(|| {
            FacilityError::os(format!("handle {} is not open", handle), ERROR_INVALID_HANDLE)
        })?;
        let memory = state.memory.get_mut(&pid);
        let span = memory
            .as_ref()
            .and_then(|memory| memory.span(address, data.len()));

        match (memory, span) {
            (Some(memory), Some(span)) => {
                for (addr, byte) in span.into_iter().zip(data) {
                    memory.bytes.insert(addr, *byte);
                }
                Ok(())
            }
            _ => Err(FacilityError::os(
                format!("write of {} bytes at {} crosses unwritable memory", data.len(), address),
                ERROR_PARTIAL_COPY,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facility() -> SimulatedFacility {
        SimulatedFacility::new()
            .with_process("game.exe", 10)
            .with_region(10, 0x1000, &[1, 2, 3, 4])
            .with_inaccessible(10, 0x1002, 1)
    }

    #[test]
    fn test_read_is_all_or_nothing() {
        let sim = facility();
        let handle = sim.open_process(10, ProcessAccess::ALL_ACCESS).unwrap();

        let mut buffer = [0u8; 2];
        sim.read_memory(handle, Address::new(0x1000), &mut buffer).unwrap();
        assert_eq!(buffer, [1, 2]);

        let mut buffer = [0xAAu8; 4];
        let err = sim
            .read_memory(handle, Address::new(0x1000), &mut buffer)
            .unwrap_err();
        assert!(matches!(err, FacilityError::Os { code: 299, .. }));
        assert_eq!(buffer, [0xAA; 4]);
    }

    #[test]
    fn test_write_is_all_or_nothing() {
        let sim = facility();
        let handle = sim.open_process(10, ProcessAccess::ALL_ACCESS).unwrap();

        assert!(sim
            .write_memory(handle, Address::new(0x1001), &[9, 9, 9])
            .is_err());
        assert_eq!(sim.peek(10, 0x1000, 2), Some(vec![1, 2]));

        sim.write_memory(handle, Address::new(0x1000), &[7, 8]).unwrap();
        assert_eq!(sim.peek(10, 0x1000, 2), Some(vec![7, 8]));
    }

    #[test]
    fn test_handles_are_tracked() {
        let sim = facility();
        let handle = sim.open_process(10, ProcessAccess::ALL_ACCESS).unwrap();
        assert_eq!(sim.open_handle_count(), 1);

        sim.close_handle(handle).unwrap();
        assert_eq!(sim.open_handle_count(), 0);
        assert_eq!(sim.closed_count(), 1);
        assert!(sim.close_handle(handle).is_err());

        let mut buffer = [0u8; 1];
        assert!(sim
            .read_memory(handle, Address::new(0x1000), &mut buffer)
            .is_err());
    }

    #[test]
    fn test_injected_open_failures() {
        let sim = facility()
            .with_process("locked.exe", 20)
            .with_process("broken.exe", 30)
            .with_process("partial.exe", 40)
            .denying_open(20)
            .failing_open(30)
            .denying_all_access(40);

        assert!(sim
            .open_process(20, ProcessAccess::read_write())
            .unwrap_err()
            .is_access_denied());
        assert!(!sim
            .open_process(30, ProcessAccess::ALL_ACCESS)
            .unwrap_err()
            .is_access_denied());
        assert!(sim.open_process(40, ProcessAccess::ALL_ACCESS).is_err());
        assert!(sim.open_process(40, ProcessAccess::read_write()).is_ok());
        assert!(sim.open_process(99, ProcessAccess::ALL_ACCESS).is_err());
    }

    #[test]
    fn test_exit_process_invalidates_memory() {
        let sim = facility();
        let handle = sim.open_process(10, ProcessAccess::ALL_ACCESS).unwrap();
        sim.exit_process(10);

        let mut buffer = [0u8; 1];
        assert!(sim
            .read_memory(handle, Address::new(0x1000), &mut buffer)
            .is_err());
        assert!(sim.enumerate_processes().unwrap().is_empty());
    }

    #[test]
    fn test_region_at_top_of_address_space() {
        let top = usize::MAX - 1;
        let sim = SimulatedFacility::new()
            .with_process("game.exe", 10)
            .with_region(10, top, &[1, 2, 3, 4]);

        assert_eq!(sim.peek(10, top, 2), Some(vec![1, 2]));
        assert_eq!(sim.peek(10, top, 3), None);
        assert_eq!(sim.peek(10, 0, 1), None);

        let handle = sim.open_process(10, ProcessAccess::ALL_ACCESS).unwrap();
        let mut buffer = [0u8; 3];
        assert!(sim
            .read_memory(handle, Address::new(top), &mut buffer)
            .is_err());
    }

    #[test]
    fn test_calls_are_counted() {
        let sim = facility();
        assert_eq!(sim.calls(), 0);
        let _ = sim.enumerate_processes();
        let _ = sim.elevate_privilege();
        assert_eq!(sim.calls(), 2);
        assert_eq!(sim.privilege_requests(), 1);
        let _ = sim.peek(10, 0x1000, 1);
        assert_eq!(sim.calls(), 2);
    }
}
