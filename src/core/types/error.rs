//! Custom error types for rwmem

use super::ValueKind;
use std::fmt;
use thiserror::Error;

/// Main error type for process memory operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryError {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Privilege denied for process {pid}: {reason}")]
    PrivilegeDenied { pid: u32, reason: String },

    #[error("Failed to open process {pid}: {reason}")]
    HandleOpenFailed { pid: u32, reason: String },

    #[error("No open handle for process {0}")]
    NoHandle(u32),

    #[error("Process is not open: {0}")]
    NotOpen(String),

    #[error("Failed to read memory at {address}: {reason}")]
    ReadFailed { address: String, reason: String },

    #[error("Failed to write memory at {address}: {reason}")]
    WriteFailed { address: String, reason: String },

    #[error("Invalid data type: {0}")]
    InvalidDataType(String),

    #[error("Invalid size {size} for {kind} read (limit {limit})")]
    InvalidSize {
        kind: ValueKind,
        size: usize,
        limit: usize,
    },

    #[error("String at {address} is not terminated within {limit} bytes")]
    Unterminated { address: String, limit: usize },

    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

impl MemoryError {
    /// Creates a privilege denied error for a process
    pub fn privilege_denied(pid: u32, reason: impl Into<String>) -> Self {
        MemoryError::PrivilegeDenied {
            pid,
            reason: reason.into(),
        }
    }

    /// Creates a handle open failure for a process
    pub fn handle_open_failed(pid: u32, reason: impl Into<String>) -> Self {
        MemoryError::HandleOpenFailed {
            pid,
            reason: reason.into(),
        }
    }

    /// Creates a read failed error
    pub fn read_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        MemoryError::ReadFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a write failed error
    pub fn write_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        MemoryError::WriteFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error means the session was never established
    pub fn is_not_open(&self) -> bool {
        matches!(self, MemoryError::NotOpen(_))
    }
}
