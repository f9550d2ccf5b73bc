use slotjar_store::{SlotName, StoreError};
use slotjar_value::ValueError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The value read back differs from the value written.
    #[error("round-trip mismatch in slot {slot}: wrote {written}, read back {read}")]
    Mismatch {
        slot: SlotName,
        written: String,
        read: String,
    },

    #[error("invalid sample value: {0}")]
    Sample(#[from] ValueError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to render slot {slot}: {reason}")]
    Render { slot: SlotName, reason: String },
}

impl HarnessError {
    /// The slot this error concerns, when there is one.
    pub fn slot(&self) -> Option<&SlotName> {
        match self {
            Self::Store(e) => e.slot(),
            Self::Mismatch { slot, .. } | Self::Render { slot, .. } => Some(slot),
            Self::Sample(_) | Self::Config(_) => None,
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
