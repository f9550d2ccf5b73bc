use serde::{Deserialize, Serialize};

use crate::error::{ValueError, ValueResult};
use crate::record::Record;

/// The kind tag of a [`Value`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    None,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    Tuple,
    List,
    Dict,
    Record,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::Tuple => "tuple",
            Self::List => "list",
            Self::Dict => "dict",
            Self::Record => "record",
        };
        f.write_str(name)
    }
}

/// A sample value: a scalar, a container of values, or an open record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Ordered, fixed-size sequence.
    Tuple(Vec<Value>),
    /// Ordered, growable sequence.
    List(Vec<Value>),
    /// Keyed mapping in insertion order.
    Dict(Vec<(Value, Value)>),
    Record(Record),
}

impl Value {
    /// Build a tuple from anything convertible into values.
    pub fn tuple<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Build a list from anything convertible into values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a mapping, rejecting unhashable keys and keeping the last
    /// value for a repeated key at the key's first position.
    pub fn dict<I, K, V>(pairs: I) -> ValueResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut entries: Vec<(Value, Value)> = Vec::new();
        for (key, value) in pairs {
            let key = key.into();
            if !key.is_hashable() {
                return Err(ValueError::UnhashableKey(key.kind()));
            }
            let value = value.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
        Ok(Self::Dict(entries))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::None => ValueKind::None,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::Str,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Tuple(_) => ValueKind::Tuple,
            Self::List(_) => ValueKind::List,
            Self::Dict(_) => ValueKind::Dict,
            Self::Record(_) => ValueKind::Record,
        }
    }

    /// Whether this value may be used as a mapping key.
    ///
    /// Scalars, strings, bytes, and tuples of hashable members qualify.
    /// Lists, mappings, and records are mutable containers and do not.
    pub fn is_hashable(&self) -> bool {
        match self {
            Self::None
            | Self::Bool(_)
            | Self::Int(_)
            | Self::Float(_)
            | Self::Str(_)
            | Self::Bytes(_) => true,
            Self::Tuple(items) => items.iter().all(Value::is_hashable),
            Self::List(_) | Self::Dict(_) | Self::Record(_) => false,
        }
    }

    /// Look up a key in a mapping. Returns `None` for non-mappings.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Self::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Maximum container nesting below this value (scalars are depth 0).
    pub fn depth(&self) -> usize {
        match self {
            Self::Tuple(items) | Self::List(items) => {
                1 + items.iter().map(Value::depth).max().unwrap_or(0)
            }
            Self::Dict(entries) => {
                1 + entries
                    .iter()
                    .map(|(k, v)| k.depth().max(v.depth()))
                    .max()
                    .unwrap_or(0)
            }
            Self::Record(record) => {
                1 + record.fields().map(|(_, v)| v.depth()).max().unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Exact structural identity: like `==`, but floats compare by bit
    /// pattern, so `NaN` matches itself and `-0.0` differs from `0.0`.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Tuple(a), Self::Tuple(b)) | (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            (Self::Dict(a), Self::Dict(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka.same_as(kb) && va.same_as(vb))
            }
            (Self::Record(a), Self::Record(b)) => {
                a.class() == b.class()
                    && a.len() == b.len()
                    && a
                        .fields()
                        .zip(b.fields())
                        .all(|((na, va), (nb, vb))| na == nb && va.same_as(vb))
            }
            (a, b) => a == b,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_int_float_are_distinct() {
        assert_ne!(Value::Bool(true), Value::Int(1));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Bool(false), Value::Int(0));
    }

    #[test]
    fn tuple_and_list_are_distinct() {
        let t = Value::tuple([2, 4, 6]);
        let l = Value::list([2, 4, 6]);
        assert_ne!(t, l);
        assert_eq!(t.kind(), ValueKind::Tuple);
        assert_eq!(l.kind(), ValueKind::List);
    }

    #[test]
    fn dict_rejects_list_key() {
        let err = Value::dict([(Value::list([1]), Value::Int(1))]).unwrap_err();
        assert_eq!(err, ValueError::UnhashableKey(ValueKind::List));
    }

    #[test]
    fn dict_accepts_tuple_key() {
        let d = Value::dict([(Value::tuple([1, 2]), "pair")]).unwrap();
        assert_eq!(d.get(&Value::tuple([1, 2])), Some(&Value::from("pair")));
    }

    #[test]
    fn dict_rejects_tuple_containing_list() {
        let key = Value::Tuple(vec![Value::Int(1), Value::list([2])]);
        assert!(!key.is_hashable());
        assert!(Value::dict([(key, 0)]).is_err());
    }

    #[test]
    fn dict_repeated_key_keeps_first_position() {
        let d = Value::dict([("a", 1), ("b", 2), ("a", 3)]).unwrap();
        match d {
            Value::Dict(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0], (Value::from("a"), Value::Int(3)));
            }
            other => panic!("expected dict, got {other:?}"),
        }
    }

    #[test]
    fn depth_counts_nesting() {
        assert_eq!(Value::Int(1).depth(), 0);
        assert_eq!(Value::list([1]).depth(), 1);
        let nested = Value::Tuple(vec![Value::Tuple(vec![Value::list([1])])]);
        assert_eq!(nested.depth(), 3);
    }

    #[test]
    fn same_as_compares_float_bits() {
        let nan = Value::list([Value::Float(f64::NAN)]);
        assert_ne!(nan, nan.clone());
        assert!(nan.same_as(&nan.clone()));

        assert_eq!(Value::Float(0.0), Value::Float(-0.0));
        assert!(!Value::Float(0.0).same_as(&Value::Float(-0.0)));

        assert!(!Value::Int(1).same_as(&Value::Float(1.0)));
        assert!(!Value::tuple([1]).same_as(&Value::list([1])));
    }

    #[test]
    fn same_as_recurses_into_records_and_dicts() {
        let rec = |x: f64| {
            Value::Record(
                Record::new("S")
                    .with_field("d", Value::dict([("k", Value::Float(x))]).unwrap())
                    .unwrap(),
            )
        };
        assert!(rec(f64::NAN).same_as(&rec(f64::NAN)));
        assert!(!rec(0.0).same_as(&rec(-0.0)));
        assert!(rec(1.5).same_as(&rec(1.5)));
    }

    #[test]
    fn option_converts_to_none() {
        let v: Value = Option::<i64>::None.into();
        assert_eq!(v, Value::None);
        let v: Value = Some(3i64).into();
        assert_eq!(v, Value::Int(3));
    }

    #[test]
    fn serde_json_keeps_kind_tags() {
        let v = Value::tuple([Value::Int(1), Value::Float(1.0), Value::Bool(true)]);
        let json = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
