//! Slot name validation.
//!
//! A slot name doubles as a file name, so it must be a single safe path
//! segment:
//! - Must be non-empty and at most 255 bytes
//! - Only ASCII letters, digits, `-`, `_` and `.`
//! - Must not start with `.` (this also rules out `.` and `..`)

use std::fmt;
use std::str::FromStr;

use crate::error::{StoreError, StoreResult};

const MAX_LEN: usize = 255;

/// A validated slot identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotName(String);

impl SlotName {
    /// Validate and wrap a slot name.
    ///
    /// # Examples
    ///
    /// ```
    /// use slotjar_store::SlotName;
    ///
    /// assert!(SlotName::new("test1").is_ok());
    /// assert!(SlotName::new("").is_err());
    /// assert!(SlotName::new("../escape").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();
        validate(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate(name: &str) -> StoreResult<()> {
    let reject = |reason: String| {
        Err(StoreError::InvalidSlot {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return reject("slot name must not be empty".into());
    }
    if name.len() > MAX_LEN {
        return reject(format!("slot name longer than {MAX_LEN} bytes"));
    }
    if name.starts_with('.') {
        return reject("must not start with '.'".into());
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return reject(format!("contains forbidden character: {ch:?}"));
    }
    Ok(())
}

impl FromStr for SlotName {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for SlotName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
