use serde::{Deserialize, Serialize};

use crate::error::{ValueError, ValueResult};
use crate::value::Value;

/// An open record: a class name plus named fields in attachment order.
///
/// The field set is not fixed by the class. Fields may be attached with
/// [`Record::set_field`] at any point after construction and survive a
/// round-trip exactly like fields supplied up front.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    class: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: Vec::new(),
        }
    }

    /// Builder form of [`Record::set_field`].
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> ValueResult<Self> {
        self.set_field(name, value)?;
        Ok(self)
    }

    /// Attach a field, or replace it in place if it already exists.
    ///
    /// Returns the previous value when one was replaced.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> ValueResult<Option<Value>> {
        validate_field_name(name)?;
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => Ok(Some(std::mem::replace(existing, value))),
            None => {
                self.fields.push((name.to_string(), value));
                Ok(None)
            }
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(pos).1)
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Fields in attachment order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Field names are identifiers: a leading letter or underscore followed by
/// letters, digits, or underscores.
fn validate_field_name(name: &str) -> ValueResult<()> {
    let mut chars = name.chars();
    match chars.next() {
        None => Err(ValueError::InvalidFieldName {
            name: name.to_string(),
            reason: "field name must not be empty".into(),
        }),
        Some(c) if !(c.is_alphabetic() || c == '_') => Err(ValueError::InvalidFieldName {
            name: name.to_string(),
            reason: format!("must not start with {c:?}"),
        }),
        Some(_) => match chars.find(|c| !(c.is_alphanumeric() || *c == '_')) {
            Some(bad) => Err(ValueError::InvalidFieldName {
                name: name.to_string(),
                reason: format!("contains forbidden character: {bad:?}"),
            }),
            None => Ok(()),
        },
    }
}
