//! Windows error code handling utilities

use crate::facility::FacilityError;
use std::fmt;
use winapi::um::errhandlingapi::GetLastError;

/// Common Windows error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success,
    AccessDenied,
    InvalidHandle,
    BadLength,
    InvalidParameter,
    PartialCopy,
    InvalidAddress,
    NotAllAssigned,
    Unknown(u32),
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        match code {
            0 => ErrorCode::Success,
            5 => ErrorCode::AccessDenied,
            6 => ErrorCode::InvalidHandle,
            24 => ErrorCode::BadLength,
            87 => ErrorCode::InvalidParameter,
            299 => ErrorCode::PartialCopy,
            487 => ErrorCode::InvalidAddress,
            1300 => ErrorCode::NotAllAssigned,
            _ => ErrorCode::Unknown(code),
        }
    }
}

impl ErrorCode {
    /// Get the last Windows error
    pub fn last_error() -> Self {
        unsafe { ErrorCode::from(GetLastError()) }
    }

    /// Numeric Win32 code
    pub fn code(&self) -> u32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::AccessDenied => 5,
            ErrorCode::InvalidHandle => 6,
            ErrorCode::BadLength => 24,
            ErrorCode::InvalidParameter => 87,
            ErrorCode::PartialCopy => 299,
            ErrorCode::InvalidAddress => 487,
            ErrorCode::NotAllAssigned => 1300,
            ErrorCode::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Success => write!(f, "Success"),
            ErrorCode::AccessDenied => write!(f, "Access denied"),
            ErrorCode::InvalidHandle => write!(f, "Invalid handle"),
            ErrorCode::BadLength => write!(f, "Bad length"),
            ErrorCode::InvalidParameter => write!(f, "Invalid parameter"),
            ErrorCode::PartialCopy => write!(f, "Partial copy"),
            ErrorCode::InvalidAddress => write!(f, "Invalid address"),
            ErrorCode::NotAllAssigned => write!(f, "Not all privileges assigned"),
            ErrorCode::Unknown(code) => write!(f, "Unknown error: {}", code),
        }
    }
}

/// Windows error wrapper
#[derive(Debug, Clone)]
pub struct WinError {
    code: ErrorCode,
    context: String,
}

impl WinError {
    /// Capture `GetLastError` with context
    pub fn new(context: impl Into<String>) -> Self {
        WinError {
            code: ErrorCode::last_error(),
            context: context.into(),
        }
    }

    /// Create with specific error code
    pub fn with_code(code: ErrorCode, context: impl Into<String>) -> Self {
        WinError {
            code,
            context: context.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl fmt::Display for WinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.code)
    }
}

impl From<WinError> for FacilityError {
    fn from(err: WinError) -> Self {
        match err.code {
            ErrorCode::AccessDenied => FacilityError::AccessDenied(err.to_string()),
            code => FacilityError::os(err.to_string(), code.code()),
        }
    }
}
