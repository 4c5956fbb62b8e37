//! Typed reads and writes on top of [`MemoryAccess`]
//!
//! Numbers travel as 4-byte little-endian words (two's complement for
//! signed, IEEE-754 binary32 for floats). Strings are read as a
//! zero-terminated byte scan and written without a terminator.

use super::access::{MemoryAccess, OpenOptions};
use crate::config::{validate_config, Config, ConfigError, MemoryConfig};
use crate::core::types::{
    Address, MemoryError, MemoryResult, ProcessRef, TypedValue, ValueKind,
};
use crate::facility::ProcessFacility;
use crate::process::ProcessResolver;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A typed view of one target process's memory.
///
/// Construction never fails. If the process cannot be resolved or opened the
/// marshaller is left closed: [`is_open`](Self::is_open) is false and every
/// operation returns [`MemoryError::NotOpen`] without touching the facility.
pub struct ProcessMemory<F: ProcessFacility> {
    process_name: String,
    resolver: ProcessResolver<F>,
    session: Option<MemoryAccess<F>>,
    attach_error: Option<MemoryError>,
    limits: MemoryConfig,
}

impl<F: ProcessFacility> ProcessMemory<F> {
    /// Attach to the first process named `name` using default settings
    pub fn attach(facility: Arc<F>, name: &str) -> Self {
        Self::attach_with_config(facility, name, &Config::default())
    }

    /// Resolve `name` and open a session to it.
    ///
    /// A config that fails validation leaves the marshaller closed with
    /// [`MemoryError::InvalidConfig`] before the facility is touched.
    pub fn attach_with_config(facility: Arc<F>, name: &str, config: &Config) -> Self {
        let resolver = ProcessResolver::new(Arc::clone(&facility));
        let options = OpenOptions::from(&config.session);

        let opened = validate_config(config)
            .map_err(|e| match e {
                ConfigError::Invalid(reason) => MemoryError::InvalidConfig(reason),
                other => MemoryError::InvalidConfig(other.to_string()),
            })
            .and_then(|()| resolver.find_process(name))
            .and_then(|process| MemoryAccess::open_with(facility, process, options));

        let (session, attach_error) = match opened {
            Ok(session) => {
                info!(process = %session.process(), "attached");
                (Some(session), None)
            }
            Err(e) => {
                warn!(process = name, error = %e, "attach failed, memory access disabled");
                (None, Some(e))
            }
        };

        ProcessMemory {
            process_name: name.to_string(),
            resolver,
            session,
            attach_error,
            limits: config.memory.clone(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.as_ref().map_or(false, MemoryAccess::is_open)
    }

    /// The attached process, if any
    pub fn process(&self) -> Option<&ProcessRef> {
        self.session.as_ref().map(MemoryAccess::process)
    }

    /// Why construction left the marshaller closed
    pub fn attach_error(&self) -> Option<&MemoryError> {
        self.attach_error.as_ref()
    }

    pub fn privilege_elevated(&self) -> bool {
        self.session.as_ref().map_or(false, MemoryAccess::elevated)
    }

    fn session(&self) -> MemoryResult<&MemoryAccess<F>> {
        self.session
            .as_ref()
            .ok_or_else(|| MemoryError::NotOpen(self.process_name.clone()))
    }

    /// Base address of the module named `name` in the attached process
    pub fn resolve_module(&self, name: &str) -> MemoryResult<Address> {
        let session = self.session()?;
        let module = self.resolver.find_module(session.process(), name)?;
        Ok(module.base_address)
    }

    /// Read a value of `kind` at `address`.
    ///
    /// `size` is only used by [`ValueKind::ByteArray`], as a byte count.
    pub fn read(&self, address: Address, size: usize, kind: ValueKind) -> MemoryResult<TypedValue> {
        let session = self.session()?;

        let value = match kind.size() {
            Some(width) => {
                let bytes = session.read_bytes(address, width)?;
                TypedValue::from_bytes(&bytes, kind).ok_or_else(|| {
                    MemoryError::read_failed(address, format!("short {} read", kind))
                })?
            }
            None if kind == ValueKind::String => {
                TypedValue::String(self.scan_string(session, address)?)
            }
            None => {
                self.check_array_size(size)?;
                TypedValue::ByteArray(session.read_bytes(address, size)?)
            }
        };

        debug!(address = %address, kind = %kind, "read");
        Ok(value)
    }

    /// [`read`](Self::read) with a numeric kind tag
    pub fn read_tagged(&self, address: Address, size: usize, tag: u8) -> MemoryResult<TypedValue> {
        let kind = ValueKind::try_from(tag)?;
        self.read(address, size, kind)
    }

    /// Write `value` at `address`. Byte arrays are read-only.
    pub fn write(&self, address: Address, value: &TypedValue) -> MemoryResult<()> {
        let session = self.session()?;

        let bytes = value.to_bytes()?;
        session.write_bytes(address, &bytes)?;
        debug!(address = %address, kind = %value.kind(), len = bytes.len(), "wrote");
        Ok(())
    }

    /// [`write`](Self::write) with a numeric kind tag that must agree with `value`
    pub fn write_tagged(&self, address: Address, tag: u8, value: &TypedValue) -> MemoryResult<()> {
        let kind = ValueKind::try_from(tag)?;
        if kind != value.kind() {
            return Err(MemoryError::InvalidDataType(format!(
                "tag {} does not match {} value",
                kind,
                value.kind()
            )));
        }
        self.write(address, value)
    }

    fn check_array_size(&self, size: usize) -> MemoryResult<()> {
        let limit = self.limits.max_read_size;
        if size == 0 || size > limit {
            return Err(MemoryError::InvalidSize {
                kind: ValueKind::ByteArray,
                size,
                limit,
            });
        }
        Ok(())
    }

    /// One byte at a time until a zero byte, which is not included
    fn scan_string(&self, session: &MemoryAccess<F>, start: Address) -> MemoryResult<String> {
        let mut bytes = Vec::new();
        let mut cursor = start;

        loop {
            let [byte] = session.read_exact::<1>(cursor)?;
            if byte == 0 {
                break;
            }
            if let Some(limit) = self.limits.max_string_len {
                if bytes.len() >= limit {
                    return Err(MemoryError::Unterminated {
                        address: start.to_string(),
                        limit,
                    });
                }
            }
            bytes.push(byte);
            cursor = cursor.checked_add(1).ok_or_else(|| {
                MemoryError::read_failed(start, "string runs past the end of the address space")
            })?;
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl<F: ProcessFacility> fmt::Debug for ProcessMemory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessMemory")
            .field("process_name", &self.process_name)
            .field("session", &self.session)
            .field("attach_error", &self.attach_error)
            .finish()
    }
}
