//! Typed values read from or written to remote memory.
//!
//! Every remote read declares a [`ValueKind`] up front and gets back a
//! [`TypedValue`] of exactly that kind. Conversions between kinds are never
//! implicit: asking a `U16` value for a `u32` yields `None`.

use std::fmt;

use encoding_rs::{UTF_16LE, WINDOWS_1252};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Text encodings understood by string reads.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StringEncoding {
    #[default]
    Utf8,
    Utf16le,
    Latin1,
}

impl StringEncoding {
    /// Width in bytes of the terminating NUL.
    pub fn unit_width(self) -> usize {
        match self {
            Self::Utf16le => 2,
            Self::Utf8 | Self::Latin1 => 1,
        }
    }

    /// Decode `bytes` up to the first NUL terminator.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            Self::Utf8 => {
                let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                String::from_utf8(bytes[..len].to_vec()).map_err(|e| {
                    Error::EncodingError(format!("Failed to decode UTF-8 string: {}", e))
                })
            }
            Self::Utf16le => {
                let len = bytes
                    .chunks_exact(2)
                    .position(|pair| pair == [0, 0])
                    .map_or(bytes.len() & !1, |units| units * 2);
                let (text, had_errors) = UTF_16LE.decode_without_bom_handling(&bytes[..len]);
                if had_errors {
                    return Err(Error::EncodingError(
                        "Failed to decode UTF-16LE string".to_string(),
                    ));
                }
                Ok(text.into_owned())
            }
            Self::Latin1 => {
                let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                let (text, _) = WINDOWS_1252.decode_without_bom_handling(&bytes[..len]);
                Ok(text.into_owned())
            }
        }
    }

    /// Encode `text` followed by a NUL terminator.
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        let mut out = match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf16le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Self::Latin1 => {
                let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
                if unmappable {
                    return Err(Error::EncodingError(format!(
                        "'{}' is not representable in Latin-1",
                        text
                    )));
                }
                bytes.into_owned()
            }
        };
        out.extend(std::iter::repeat_n(0u8, self.unit_width()));
        Ok(out)
    }
}

/// The declared shape of a remote value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Bytes(usize),
    /// Fixed-capacity string buffer of `max_len` bytes.
    String {
        max_len: usize,
        encoding: StringEncoding,
    },
}

impl ValueKind {
    /// Pointers in the target are always 64-bit.
    pub const POINTER: ValueKind = ValueKind::U64;

    pub const fn size(&self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::Bytes(len) => *len,
            Self::String { max_len, .. } => *max_len,
        }
    }

    /// Parse a kind name as used on the command line (`u32`, `bytes:16`, `utf8:16`).
    pub fn parse(text: &str) -> Result<Self> {
        let lower = text.trim().to_ascii_lowercase();
        let (name, len) = match lower.split_once(':') {
            Some((name, len)) => {
                let len = len.parse::<usize>().map_err(|_| {
                    Error::ConfigParseError(format!("Invalid length in value kind '{}'", text))
                })?;
                (name.to_string(), Some(len))
            }
            None => (lower, None),
        };

        let kind = match (name.as_str(), len) {
            ("u8", None) => Self::U8,
            ("i8", None) => Self::I8,
            ("u16", None) => Self::U16,
            ("i16", None) => Self::I16,
            ("u32", None) => Self::U32,
            ("i32", None) => Self::I32,
            ("u64", None) | ("ptr", None) => Self::U64,
            ("i64", None) => Self::I64,
            ("f32", None) => Self::F32,
            ("f64", None) => Self::F64,
            ("bytes", Some(len)) => Self::Bytes(len),
            (encoding, Some(max_len)) => Self::String {
                max_len,
                encoding: encoding.parse().map_err(|_| {
                    Error::ConfigParseError(format!("Unknown value kind '{}'", text))
                })?,
            },
            _ => return Err(Error::ConfigParseError(format!("Unknown value kind '{}'", text))),
        };
        Ok(kind)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => f.write_str("u8"),
            Self::I8 => f.write_str("i8"),
            Self::U16 => f.write_str("u16"),
            Self::I16 => f.write_str("i16"),
            Self::U32 => f.write_str("u32"),
            Self::I32 => f.write_str("i32"),
            Self::U64 => f.write_str("u64"),
            Self::I64 => f.write_str("i64"),
            Self::F32 => f.write_str("f32"),
            Self::F64 => f.write_str("f64"),
            Self::Bytes(len) => write!(f, "bytes[{}]", len),
            Self::String { max_len, encoding } => write!(f, "{} string[{}]", encoding, max_len),
        }
    }
}

/// A value decoded from remote memory, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
    String(String),
}

macro_rules! fixed {
    ($bytes:expr, $ty:ty) => {{
        let mut raw = [0u8; std::mem::size_of::<$ty>()];
        raw.copy_from_slice(&$bytes[..std::mem::size_of::<$ty>()]);
        <$ty>::from_le_bytes(raw)
    }};
}

impl TypedValue {
    /// Decode `bytes` as `kind`. `bytes` must hold at least `kind.size()` bytes.
    pub fn decode(kind: ValueKind, bytes: &[u8]) -> Result<Self> {
        if bytes.len() < kind.size() {
            return Err(Error::EncodingError(format!(
                "{} needs {} bytes, got {}",
                kind,
                kind.size(),
                bytes.len()
            )));
        }

        let value = match kind {
            ValueKind::U8 => Self::U8(bytes[0]),
            ValueKind::I8 => Self::I8(bytes[0] as i8),
            ValueKind::U16 => Self::U16(fixed!(bytes, u16)),
            ValueKind::I16 => Self::I16(fixed!(bytes, i16)),
            ValueKind::U32 => Self::U32(fixed!(bytes, u32)),
            ValueKind::I32 => Self::I32(fixed!(bytes, i32)),
            ValueKind::U64 => Self::U64(fixed!(bytes, u64)),
            ValueKind::I64 => Self::I64(fixed!(bytes, i64)),
            ValueKind::F32 => Self::F32(fixed!(bytes, f32)),
            ValueKind::F64 => Self::F64(fixed!(bytes, f64)),
            ValueKind::Bytes(len) => Self::Bytes(bytes[..len].to_vec()),
            ValueKind::String { max_len, encoding } => {
                Self::String(encoding.decode(&bytes[..max_len])?)
            }
        };
        Ok(value)
    }

    /// Little-endian encoding of a scalar or raw byte value.
    ///
    /// Strings carry no encoding of their own; write them through
    /// [`StringEncoding::encode`] instead.
    pub fn to_le_bytes(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            Self::U8(v) => vec![*v],
            Self::I8(v) => v.to_le_bytes().to_vec(),
            Self::U16(v) => v.to_le_bytes().to_vec(),
            Self::I16(v) => v.to_le_bytes().to_vec(),
            Self::U32(v) => v.to_le_bytes().to_vec(),
            Self::I32(v) => v.to_le_bytes().to_vec(),
            Self::U64(v) => v.to_le_bytes().to_vec(),
            Self::I64(v) => v.to_le_bytes().to_vec(),
            Self::F32(v) => v.to_le_bytes().to_vec(),
            Self::F64(v) => v.to_le_bytes().to_vec(),
            Self::Bytes(v) => v.clone(),
            Self::String(_) => {
                return Err(Error::EncodingError(
                    "String values need an explicit encoding".to_string(),
                ));
            }
        };
        Ok(bytes)
    }

    /// Short name of the variant, matching [`ValueKind`]'s display names.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::I8(_) => "i8",
            Self::U16(_) => "u16",
            Self::I16(_) => "i16",
            Self::U32(_) => "u32",
            Self::I32(_) => "i32",
            Self::U64(_) => "u64",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
        }
    }

    pub fn extract<T: FromValue>(self) -> Option<T> {
        T::from_value(self)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8(v) => write!(f, "{}", v),
            Self::I8(v) => write!(f, "{}", v),
            Self::U16(v) => write!(f, "{}", v),
            Self::I16(v) => write!(f, "{}", v),
            Self::U32(v) => write!(f, "{}", v),
            Self::I32(v) => write!(f, "{}", v),
            Self::U64(v) => write!(f, "{:#x}", v),
            Self::I64(v) => write!(f, "{}", v),
            Self::F32(v) => write!(f, "{}", v),
            Self::F64(v) => write!(f, "{}", v),
            Self::Bytes(v) => {
                let hex: Vec<String> = v.iter().map(|b| format!("{:02X}", b)).collect();
                f.write_str(&hex.join(" "))
            }
            Self::String(v) => write!(f, "{:?}", v),
        }
    }
}

/// Rust types that correspond to exactly one fixed-size [`ValueKind`].
pub trait FromValue: Sized {
    const KIND: ValueKind;

    fn from_value(value: TypedValue) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn from_value(value: TypedValue) -> Option<Self> {
                    match value {
                        TypedValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for TypedValue {
                fn from(v: $ty) -> Self {
                    TypedValue::$variant(v)
                }
            }
        )*
    };
}

impl_from_value! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}
