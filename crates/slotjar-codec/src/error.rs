use slotjar_value::ValueKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// The value contains something the blob format cannot represent.
    #[error("cannot encode {kind}: {reason}")]
    Unsupported { kind: ValueKind, reason: String },

    #[error("invalid blob magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported blob version: {0}")]
    UnsupportedVersion(u16),

    #[error("blob checksum mismatch: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    #[error("payload length mismatch: header declares {declared} bytes, found {actual}")]
    LengthMismatch { declared: u64, actual: u64 },

    #[error("corrupt payload at offset {offset}: {reason}")]
    Corrupt { offset: usize, reason: String },
}

impl CodecError {
    /// True when the error describes unreadable bytes rather than an
    /// unencodable value.
    pub fn is_corruption(&self) -> bool {
        !matches!(self, Self::Unsupported { .. })
    }

    pub(crate) fn corrupt(offset: usize, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            offset,
            reason: reason.into(),
        }
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
