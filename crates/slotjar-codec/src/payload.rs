//! Tagged payload encoding.
//!
//! Every value starts with one tag byte. Integers are zigzag varints, floats
//! are 8 raw IEEE-754 bytes (big-endian), strings and bytes are a varint
//! length followed by the data, and containers are a varint count followed
//! by their members.

use slotjar_value::{Record, Value, ValueKind};

use crate::error::{CodecError, CodecResult};
use crate::varint::{decode_varint, encode_varint, unzigzag, zigzag};

/// Deepest container nesting accepted by both encoder and decoder.
pub const MAX_DEPTH: usize = 128;

const TAG_NONE: u8 = 0x00;
const TAG_FALSE: u8 = 0x01;
const TAG_TRUE: u8 = 0x02;
const TAG_INT: u8 = 0x03;
const TAG_FLOAT: u8 = 0x04;
const TAG_STR: u8 = 0x05;
const TAG_BYTES: u8 = 0x06;
const TAG_TUPLE: u8 = 0x07;
const TAG_LIST: u8 = 0x08;
const TAG_DICT: u8 = 0x09;
const TAG_RECORD: u8 = 0x0A;

/// Encode a value into payload bytes (no frame).
pub fn encode(value: &Value) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    encode_value(&mut out, value, 0)?;
    Ok(out)
}

/// Decode payload bytes (no frame). Trailing bytes are an error.
pub fn decode(data: &[u8]) -> CodecResult<Value> {
    let mut decoder = Decoder { data, pos: 0 };
    let value = decoder.value(0)?;
    if decoder.pos != data.len() {
        return Err(CodecError::corrupt(
            decoder.pos,
            format!("{} trailing bytes after value", data.len() - decoder.pos),
        ));
    }
    Ok(value)
}

fn encode_value(out: &mut Vec<u8>, value: &Value, depth: usize) -> CodecResult<()> {
    if depth > MAX_DEPTH {
        return Err(CodecError::Unsupported {
            kind: value.kind(),
            reason: format!("nesting deeper than {MAX_DEPTH}"),
        });
    }
    match value {
        Value::None => out.push(TAG_NONE),
        Value::Bool(false) => out.push(TAG_FALSE),
        Value::Bool(true) => out.push(TAG_TRUE),
        Value::Int(n) => {
            out.push(TAG_INT);
            encode_varint(out, zigzag(*n));
        }
        Value::Float(x) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&x.to_be_bytes());
        }
        Value::Str(s) => {
            out.push(TAG_STR);
            encode_bytes(out, s.as_bytes());
        }
        Value::Bytes(b) => {
            out.push(TAG_BYTES);
            encode_bytes(out, b);
        }
        Value::Tuple(items) | Value::List(items) => {
            out.push(if matches!(value, Value::Tuple(_)) { TAG_TUPLE } else { TAG_LIST });
            encode_varint(out, items.len() as u64);
            for item in items {
                encode_value(out, item, depth + 1)?;
            }
        }
        Value::Dict(entries) => {
            out.push(TAG_DICT);
            encode_varint(out, entries.len() as u64);
            for (key, val) in entries {
                if !key.is_hashable() {
                    return Err(CodecError::Unsupported {
                        kind: key.kind(),
                        reason: "mapping key is not hashable".into(),
                    });
                }
                encode_value(out, key, depth + 1)?;
                encode_value(out, val, depth + 1)?;
            }
        }
        Value::Record(record) => {
            out.push(TAG_RECORD);
            encode_bytes(out, record.class().as_bytes());
            encode_varint(out, record.len() as u64);
            for (name, val) in record.fields() {
                encode_bytes(out, name.as_bytes());
                encode_value(out, val, depth + 1)?;
            }
        }
    }
    Ok(())
}

fn encode_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    encode_varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn byte(&mut self) -> CodecResult<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| CodecError::corrupt(self.pos, "unexpected end of payload"))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(CodecError::corrupt(
                self.pos,
                format!("need {len} bytes, {} remain", self.remaining()),
            ));
        }
        let data = self.data;
        let slice = &data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn varint(&mut self) -> CodecResult<u64> {
        let data = self.data;
        let (value, consumed) = decode_varint(&data[self.pos..], self.pos)?;
        self.pos += consumed;
        Ok(value)
    }

    /// Read a container count, refusing counts the remaining input cannot
    /// possibly satisfy so a forged header never drives a huge allocation.
    fn count(&mut self, min_item_len: usize) -> CodecResult<usize> {
        let at = self.pos;
        let count = self.varint()?;
        let fits = usize::try_from(count)
            .ok()
            .filter(|n| n.saturating_mul(min_item_len) <= self.remaining());
        fits.ok_or_else(|| {
            CodecError::corrupt(at, format!("count {count} exceeds remaining payload"))
        })
    }

    fn bytes(&mut self) -> CodecResult<&'a [u8]> {
        let at = self.pos;
        let len = self.varint()?;
        let len = usize::try_from(len)
            .map_err(|_| CodecError::corrupt(at, format!("length {len} out of range")))?;
        self.take(len)
    }

    fn string(&mut self) -> CodecResult<String> {
        let at = self.pos;
        let raw = self.bytes()?;
        String::from_utf8(raw.to_vec())
            .map_err(|e| CodecError::corrupt(at, format!("invalid UTF-8: {e}")))
    }

    fn value(&mut self, depth: usize) -> CodecResult<Value> {
        let at = self.pos;
        if depth > MAX_DEPTH {
            return Err(CodecError::corrupt(at, format!("nesting deeper than {MAX_DEPTH}")));
        }
        let tag = self.byte()?;
        let value = match tag {
            TAG_NONE => Value::None,
            TAG_FALSE => Value::Bool(false),
            TAG_TRUE => Value::Bool(true),
            TAG_INT => Value::Int(unzigzag(self.varint()?)),
            TAG_FLOAT => {
                let raw: [u8; 8] = self
                    .take(8)?
                    .try_into()
                    .map_err(|_| CodecError::corrupt(at, "short float"))?;
                Value::Float(f64::from_be_bytes(raw))
            }
            TAG_STR => Value::Str(self.string()?),
            TAG_BYTES => Value::Bytes(self.bytes()?.to_vec()),
            TAG_TUPLE | TAG_LIST => {
                let count = self.count(1)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.value(depth + 1)?);
                }
                if tag == TAG_TUPLE {
                    Value::Tuple(items)
                } else {
                    Value::List(items)
                }
            }
            TAG_DICT => {
                let count = self.count(2)?;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let key_at = self.pos;
                    let key = self.value(depth + 1)?;
                    if !key.is_hashable() {
                        return Err(CodecError::corrupt(
                            key_at,
                            format!("unhashable {} used as mapping key", key.kind()),
                        ));
                    }
                    let val = self.value(depth + 1)?;
                    entries.push((key, val));
                }
                Value::Dict(entries)
            }
            TAG_RECORD => Value::Record(self.record(depth)?),
            other => {
                return Err(CodecError::corrupt(at, format!("unknown tag byte 0x{other:02x}")));
            }
        };
        Ok(value)
    }

    fn record(&mut self, depth: usize) -> CodecResult<Record> {
        let class = self.string()?;
        let count = self.count(2)?;
        let mut record = Record::new(class);
        for _ in 0..count {
            let name_at = self.pos;
            let name = self.string()?;
            if record.field(&name).is_some() {
                return Err(CodecError::corrupt(name_at, format!("duplicate field {name:?}")));
            }
            let val = self.value(depth + 1)?;
            record
                .set_field(&name, val)
                .map_err(|e| CodecError::corrupt(name_at, e.to_string()))?;
        }
        Ok(record)
    }
}

/// Kind of the outermost value in a payload, without decoding it.
pub fn peek_kind(data: &[u8]) -> Option<ValueKind> {
    let kind = match *data.first()? {
        TAG_NONE => ValueKind::None,
        TAG_FALSE | TAG_TRUE => ValueKind::Bool,
        TAG_INT => ValueKind::Int,
        TAG_FLOAT => ValueKind::Float,
        TAG_STR => ValueKind::Str,
        TAG_BYTES => ValueKind::Bytes,
        TAG_TUPLE => ValueKind::Tuple,
        TAG_LIST => ValueKind::List,
        TAG_DICT => ValueKind::Dict,
        TAG_RECORD => ValueKind::Record,
        _ => return None,
    };
    Some(kind)
}
