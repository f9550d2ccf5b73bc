use thiserror::Error;

/// Errors produced by value construction helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("invalid field name {name:?}: {reason}")]
    InvalidFieldName { name: String, reason: String },

    #[error("unhashable mapping key of kind {0}")]
    UnhashableKey(crate::ValueKind),
}

pub type ValueResult<T> = Result<T, ValueError>;
