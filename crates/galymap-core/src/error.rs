use thiserror::Error;

use crate::process::ValueKind;

/// Direction of a failed remote memory operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Access {
    #[strum(serialize = "read")]
    Read,
    #[strum(serialize = "write")]
    Write,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    /// The handle is invalid or a remote read/write at `address` failed.
    #[error("Remote {access} of {kind} at address {address:#x} failed: {message}")]
    Transport {
        access: Access,
        address: u64,
        kind: ValueKind,
        message: String,
    },

    /// The read succeeded but the value failed a local sanity check.
    #[error("Unexpected data at address {address:#x}: {message}")]
    Decode { address: u64, message: String },

    #[error("Signature '{name}' not found in module image")]
    SignatureNotFound { name: String },

    #[error("Anchor '{0}' is not resolved")]
    MissingAnchor(String),

    #[error("Invalid signature pattern: {0}")]
    InvalidPattern(String),

    #[error("No player unit found in the unit table")]
    PlayerNotFound,

    #[error("Target process lost")]
    TargetLost,

    #[error("Config parse error: {0}")]
    ConfigParseError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn read_failed(address: u64, kind: ValueKind, message: impl Into<String>) -> Self {
        Self::Transport {
            access: Access::Read,
            address,
            kind,
            message: message.into(),
        }
    }

    pub fn write_failed(address: u64, kind: ValueKind, message: impl Into<String>) -> Self {
        Self::Transport {
            access: Access::Write,
            address,
            kind,
            message: message.into(),
        }
    }

    pub fn decode(address: u64, message: impl Into<String>) -> Self {
        Self::Decode {
            address,
            message: message.into(),
        }
    }

    /// Replace the kind recorded on a transport error.
    ///
    /// Typed reads go through `read_bytes`, which only knows the byte count;
    /// this restores the kind the caller actually asked for.
    pub fn with_kind(self, requested: ValueKind) -> Self {
        match self {
            Self::Transport {
                access,
                address,
                message,
                ..
            } => Self::Transport {
                access,
                address,
                kind: requested,
                message,
            },
            other => other,
        }
    }

    /// Errors that only invalidate the record being decoded, never the whole pass.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Decode { .. } | Self::EncodingError(_)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TargetLost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_mentions_address_and_kind() {
        let err = Error::read_failed(0x7FF6_1234, ValueKind::U32, "access denied");
        let text = err.to_string();
        assert!(text.contains("0x7ff61234"));
        assert!(text.contains("u32"));
        assert!(text.contains("read"));
    }

    #[test]
    fn test_with_kind_rewrites_transport_only() {
        let err = Error::read_failed(0x10, ValueKind::Bytes(8), "gone").with_kind(ValueKind::U64);
        assert!(matches!(
            err,
            Error::Transport {
                kind: ValueKind::U64,
                ..
            }
        ));

        let err = Error::decode(0x10, "bad").with_kind(ValueKind::U64);
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_classification() {
        assert!(Error::decode(0, "x").is_record_level());
        assert!(Error::read_failed(0, ValueKind::U8, "x").is_record_level());
        assert!(!Error::PlayerNotFound.is_record_level());
        assert!(Error::TargetLost.is_terminal());
        assert!(!Error::PlayerNotFound.is_terminal());
    }
}
