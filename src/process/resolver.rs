//! Process and module lookup by exact name

use crate::core::types::{MemoryError, MemoryResult, ModuleRef, ProcessRef};
use crate::facility::ProcessFacility;
use std::sync::Arc;
use tracing::{debug, warn};

/// Finds processes and modules through a facility's enumerations.
///
/// Matching is exact and case-sensitive; the first entry in facility order wins.
pub struct ProcessResolver<F: ProcessFacility> {
    facility: Arc<F>,
}

impl<F: ProcessFacility> ProcessResolver<F> {
    pub fn new(facility: Arc<F>) -> Self {
        ProcessResolver { facility }
    }

    /// All processes currently visible to the facility
    pub fn processes(&self) -> MemoryResult<Vec<ProcessRef>> {
        self.facility.enumerate_processes().map_err(|e| {
            warn!(error = %e, "process enumeration failed");
            MemoryError::ProcessNotFound(format!("process enumeration failed: {}", e))
        })
    }

    /// All modules loaded in `process`
    pub fn modules(&self, process: &ProcessRef) -> MemoryResult<Vec<ModuleRef>> {
        self.facility.enumerate_modules(process.pid).map_err(|e| {
            warn!(process = %process, error = %e, "module enumeration failed");
            MemoryError::ModuleNotFound(format!(
                "module enumeration for {} failed: {}",
                process, e
            ))
        })
    }

    /// Find the first process named exactly `name`
    pub fn find_process(&self, name: &str) -> MemoryResult<ProcessRef> {
        let found = self
            .processes()
            .map_err(|_| MemoryError::ProcessNotFound(name.to_string()))?
            .into_iter()
            .find(|p| p.name_matches(name))
            .ok_or_else(|| MemoryError::ProcessNotFound(name.to_string()))?;

        debug!(process = %found, "resolved process");
        Ok(found)
    }

    /// Find the first module named exactly `name` inside `process`
    pub fn find_module(&self, process: &ProcessRef, name: &str) -> MemoryResult<ModuleRef> {
        let found = self
            .modules(process)
            .map_err(|_| MemoryError::ModuleNotFound(name.to_string()))?
            .into_iter()
            .find(|m| m.name_matches(name))
            .ok_or_else(|| MemoryError::ModuleNotFound(name.to_string()))?;

        debug!(process = %process, module = %found, "resolved module");
        Ok(found)
    }
}

impl<F: ProcessFacility> Clone for ProcessResolver<F> {
    fn clone(&self) -> Self {
        ProcessResolver {
            facility: Arc::clone(&self.facility),
        }
    }
}
