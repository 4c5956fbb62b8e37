//! Typed values exchanged with the marshaller

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A logical value read from or written to the target process.
///
/// Numeric variants use a fixed 4-byte little-endian layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TypedValue {
    #[serde(rename = "uint")]
    Unsigned32(u32),
    #[serde(rename = "int")]
    Signed32(i32),
    #[serde(rename = "byte")]
    Byte(u8),
    #[serde(rename = "string")]
    String(String),
    #[serde(rename = "float")]
    Float32(f32),
    #[serde(rename = "array")]
    ByteArray(Vec<u8>),
}

impl TypedValue {
    /// Returns the kind tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Unsigned32(_) => ValueKind::Unsigned32,
            TypedValue::Signed32(_) => ValueKind::Signed32,
            TypedValue::Byte(_) => ValueKind::Byte,
            TypedValue::String(_) => ValueKind::String,
            TypedValue::Float32(_) => ValueKind::Float32,
            TypedValue::ByteArray(_) => ValueKind::ByteArray,
        }
    }

    /// Returns the encoded size in bytes
    pub fn size(&self) -> usize {
        match self {
            TypedValue::Unsigned32(_) | TypedValue::Signed32(_) | TypedValue::Float32(_) => 4,
            TypedValue::Byte(_) => 1,
            TypedValue::String(s) => s.len(),
            TypedValue::ByteArray(b) => b.len(),
        }
    }

    /// Encodes the value to the bytes a write sends.
    ///
    /// Strings are emitted without a terminator. Byte arrays are read-only
    /// and fail with [`MemoryError::InvalidDataType`].
    pub fn to_bytes(&self) -> MemoryResult<Vec<u8>> {
        match self {
            TypedValue::Unsigned32(v) => Ok(v.to_le_bytes().to_vec()),
            TypedValue::Signed32(v) => Ok(v.to_le_bytes().to_vec()),
            TypedValue::Byte(v) => Ok(vec![*v]),
            TypedValue::String(s) => Ok(s.as_bytes().to_vec()),
            TypedValue::Float32(v) => Ok(v.to_le_bytes().to_vec()),
            TypedValue::ByteArray(_) => Err(MemoryError::InvalidDataType(format!(
                "{} values cannot be written",
                ValueKind::ByteArray
            ))),
        }
    }

    /// Decodes a value of `kind` from exactly the bytes it occupies.
    ///
    /// Returns `None` when the length does not match a fixed-width kind.
    /// String bytes are decoded lossily.
    pub fn from_bytes(bytes: &[u8], kind: ValueKind) -> Option<Self> {
        match kind {
            ValueKind::Unsigned32 => {
                let word: [u8; 4] = bytes.try_into().ok()?;
                Some(TypedValue::Unsigned32(u32::from_le_bytes(word)))
            }
            ValueKind::Signed32 => {
                let word: [u8; 4] = bytes.try_into().ok()?;
                Some(TypedValue::Signed32(i32::from_le_bytes(word)))
            }
            ValueKind::Float32 => {
                let word: [u8; 4] = bytes.try_into().ok()?;
                Some(TypedValue::Float32(f32::from_le_bytes(word)))
            }
            ValueKind::Byte => match bytes {
                [b] => Some(TypedValue::Byte(*b)),
                _ => None,
            },
            ValueKind::String => Some(TypedValue::String(
                String::from_utf8_lossy(bytes).into_owned(),
            )),
            ValueKind::ByteArray => Some(TypedValue::ByteArray(bytes.to_vec())),
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            TypedValue::Unsigned32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            TypedValue::Signed32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            TypedValue::Float32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TypedValue::ByteArray(b) => Some(b),
            _ => None,
        }
    }
}

impl From<u32> for TypedValue {
    fn from(value: u32) -> Self {
        TypedValue::Unsigned32(value)
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        TypedValue::Signed32(value)
    }
}

impl From<u8> for TypedValue {
    fn from(value: u8) -> Self {
        TypedValue::Byte(value)
    }
}

impl From<f32> for TypedValue {
    fn from(value: f32) -> Self {
        TypedValue::Float32(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::String(value.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::String(value)
    }
}

impl From<Vec<u8>> for TypedValue {
    fn from(value: Vec<u8>) -> Self {
        TypedValue::ByteArray(value)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Unsigned32(v) => write!(f, "{}", v),
            TypedValue::Signed32(v) => write!(f, "{}", v),
            TypedValue::Byte(v) => write!(f, "0x{:02X}", v),
            TypedValue::String(s) => write!(f, "\"{}\"", s),
            TypedValue::Float32(v) => write!(f, "{}", v),
            TypedValue::ByteArray(b) => write!(f, "[{}]", hex::encode_upper(b)),
        }
    }
}

/// The closed set of kinds the marshaller understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    #[serde(rename = "uint")]
    Unsigned32,
    #[serde(rename = "int")]
    Signed32,
    #[serde(rename = "byte")]
    Byte,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "float")]
    Float32,
    #[serde(rename = "array")]
    ByteArray,
}

impl ValueKind {
    pub const ALL: [ValueKind; 6] = [
        ValueKind::Unsigned32,
        ValueKind::Signed32,
        ValueKind::Byte,
        ValueKind::String,
        ValueKind::Float32,
        ValueKind::ByteArray,
    ];

    /// Returns the fixed size in bytes, or `None` for variable-length kinds
    pub fn size(&self) -> Option<usize> {
        match self {
            ValueKind::Unsigned32 | ValueKind::Signed32 | ValueKind::Float32 => Some(4),
            ValueKind::Byte => Some(1),
            ValueKind::String | ValueKind::ByteArray => None,
        }
    }

    /// Numeric tag used by raw-tag callers
    pub fn tag(&self) -> u8 {
        match self {
            ValueKind::Unsigned32 => 0,
            ValueKind::Signed32 => 1,
            ValueKind::Byte => 2,
            ValueKind::String => 3,
            ValueKind::Float32 => 4,
            ValueKind::ByteArray => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Unsigned32 => "uint",
            ValueKind::Signed32 => "int",
            ValueKind::Byte => "byte",
            ValueKind::String => "string",
            ValueKind::Float32 => "float",
            ValueKind::ByteArray => "array",
        }
    }
}

impl TryFrom<u8> for ValueKind {
    type Error = MemoryError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        ValueKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| MemoryError::InvalidDataType(format!("tag {}", tag)))
    }
}

impl FromStr for ValueKind {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| MemoryError::InvalidDataType(s.to_string()))
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
