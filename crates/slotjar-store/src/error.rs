use slotjar_codec::CodecError;

use crate::slot::SlotName;

/// Errors from slot store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O failure on the data directory or a slot file.
    #[error("I/O error on {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// The slot has never been written.
    #[error("slot not found: {slot}")]
    NotFound { slot: SlotName },

    /// The slot holds bytes that are not a valid blob.
    #[error("corrupt blob in slot {slot}: {source}")]
    Corrupt {
        slot: SlotName,
        #[source]
        source: CodecError,
    },

    /// The value could not be encoded.
    #[error("cannot serialize value for slot {slot}: {source}")]
    Serialization {
        slot: SlotName,
        #[source]
        source: CodecError,
    },

    #[error("invalid slot name {name:?}: {reason}")]
    InvalidSlot { name: String, reason: String },
}

impl StoreError {
    /// Classify a codec error raised while handling `slot`.
    pub fn codec(slot: &SlotName, source: CodecError) -> Self {
        if source.is_corruption() {
            Self::Corrupt {
                slot: slot.clone(),
                source,
            }
        } else {
            Self::Serialization {
                slot: slot.clone(),
                source,
            }
        }
    }

    pub(crate) fn io(target: impl std::fmt::Display, source: std::io::Error) -> Self {
        Self::Io {
            target: target.to_string(),
            source,
        }
    }

    /// The slot this error concerns, when there is one.
    pub fn slot(&self) -> Option<&SlotName> {
        match self {
            Self::NotFound { slot }
            | Self::Corrupt { slot, .. }
            | Self::Serialization { slot, .. } => Some(slot),
            Self::Io { .. } | Self::InvalidSlot { .. } => None,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
