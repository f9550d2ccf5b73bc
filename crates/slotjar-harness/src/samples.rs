//! The fixed sample values written by every run, in write order.

use slotjar_store::SlotName;
use slotjar_value::{Record, Value};

use crate::error::HarnessResult;

/// A sample value and the slot it is written to.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub slot: SlotName,
    pub value: Value,
}

impl Sample {
    pub fn new(slot: &str, value: Value) -> HarnessResult<Self> {
        Ok(Self {
            slot: SlotName::new(slot)?,
            value,
        })
    }
}

/// All samples in the order they are written and read.
pub fn samples() -> HarnessResult<Vec<Sample>> {
    Ok(vec![
        Sample::new("test1", mixed_tuple(Value::Int(2), Value::Int(4)))?,
        Sample::new("test2", mixed_tuple(Value::Float(2.0), Value::Float(4.0)))?,
        Sample::new("test3", scalars())?,
        Sample::new("test4", mapping()?)?,
        Sample::new("test5", record()?)?,
    ])
}

/// `(1, second, 3, fourth, (5, 6, 7), 'Test', ('This is just a test.', [2, 4, 6, 8]), 'One', 'Two', 'Three')`
fn mixed_tuple(second: Value, fourth: Value) -> Value {
    Value::Tuple(vec![
        Value::Int(1),
        second,
        Value::Int(3),
        fourth,
        Value::tuple([5, 6, 7]),
        Value::from("Test"),
        Value::Tuple(vec![
            Value::from("This is just a test."),
            Value::list([2, 4, 6, 8]),
        ]),
        Value::from("One"),
        Value::from("Two"),
        Value::from("Three"),
    ])
}

/// Scalars that only differ by kind sit next to each other.
fn scalars() -> Value {
    Value::List(vec![
        Value::Bool(true),
        Value::Int(1),
        Value::Float(1.0),
        Value::Bool(false),
        Value::Int(0),
        Value::None,
        Value::Int(-42),
        Value::Float(6.25),
        Value::from("mixed"),
        Value::Bytes(b"\x00\x01raw".to_vec()),
    ])
}

fn mapping() -> HarnessResult<Value> {
    let nested = Value::dict([
        ("inner", Value::Tuple(vec![Value::Float(1.5), Value::from("x")])),
        ("empty", Value::List(vec![])),
    ])?;
    Ok(Value::dict([
        (Value::from("name"), Value::from("slotjar")),
        (Value::from("count"), Value::Int(3)),
        (Value::from("ratio"), Value::Float(0.75)),
        (Value::from("enabled"), Value::Bool(true)),
        (Value::tuple([1, 2]), Value::from("tuple key")),
        (Value::Int(7), Value::list([1, 2, 3])),
        (Value::from("nested"), nested),
    ])?)
}

/// A record that gains its `extra` field after construction.
fn record() -> HarnessResult<Value> {
    let mut sample = Record::new("Sample")
        .with_field("name", "alpha")?
        .with_field(
            "values",
            Value::List(vec![Value::Int(1), Value::Float(2.5), Value::from("three")]),
        )?;
    sample.set_field(
        "extra",
        Value::dict([("added", Value::from("later")), ("flag", Value::Bool(false))])?,
    )?;
    Ok(Value::Record(sample))
}
