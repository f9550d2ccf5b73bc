//! Reader for Python pickle streams.
//!
//! Covers the plain-data subset of protocols 2 through 5: `None`, booleans,
//! integers up to 64 bits, floats, `str`, `bytes`, tuples, lists and dicts,
//! plus the framing, mark and memo opcodes the pickler emits around them.
//! Opcodes that import or construct objects (`GLOBAL`, `REDUCE`, `BUILD`,
//! and the rest) are refused like any other unknown opcode.
//!
//! Every failure is a [`CodecError::Corrupt`] carrying the offset of the
//! opcode that failed, except integers wider than 64 bits, which are
//! [`CodecError::Unsupported`].

use std::collections::HashMap;

use slotjar_value::{Value, ValueKind};
use tracing::trace;

use crate::error::{CodecError, CodecResult};
use crate::payload::MAX_DEPTH;

/// Highest pickle protocol understood.
pub const HIGHEST_PROTOCOL: u8 = 5;

/// Cap on values copied out of the memo (or by `DUP`) over one stream.
const MAX_SHARED_NODES: usize = 1 << 20;

mod op {
    pub const PROTO: u8 = 0x80;
    pub const FRAME: u8 = 0x95;
    pub const STOP: u8 = b'.';
    pub const MARK: u8 = b'(';
    pub const POP: u8 = b'0';
    pub const POP_MARK: u8 = b'1';
    pub const DUP: u8 = b'2';

    pub const NONE: u8 = b'N';
    pub const NEWTRUE: u8 = 0x88;
    pub const NEWFALSE: u8 = 0x89;
    pub const BININT: u8 = b'J';
    pub const BININT1: u8 = b'K';
    pub const BININT2: u8 = b'M';
    pub const LONG1: u8 = 0x8a;
    pub const BINFLOAT: u8 = b'G';

    pub const SHORT_BINUNICODE: u8 = 0x8c;
    pub const BINUNICODE: u8 = b'X';
    pub const BINUNICODE8: u8 = 0x8d;
    pub const SHORT_BINBYTES: u8 = b'C';
    pub const BINBYTES: u8 = b'B';
    pub const BINBYTES8: u8 = 0x8e;

    pub const EMPTY_TUPLE: u8 = b')';
    pub const TUPLE: u8 = b't';
    pub const TUPLE1: u8 = 0x85;
    pub const TUPLE2: u8 = 0x86;
    pub const TUPLE3: u8 = 0x87;
    pub const EMPTY_LIST: u8 = b']';
    pub const APPEND: u8 = b'a';
    pub const APPENDS: u8 = b'e';
    pub const LIST: u8 = b'l';
    pub const EMPTY_DICT: u8 = b'}';
    pub const DICT: u8 = b'd';
    pub const SETITEM: u8 = b's';
    pub const SETITEMS: u8 = b'u';

    pub const MEMOIZE: u8 = 0x94;
    pub const BINPUT: u8 = b'q';
    pub const LONG_BINPUT: u8 = b'r';
    pub const BINGET: u8 = b'h';
    pub const LONG_BINGET: u8 = b'j';
}

/// Load a single pickle that spans all of `data`.
pub fn load(data: &[u8]) -> CodecResult<Value> {
    let (value, end) = load_from(data, 0)?;
    if end != data.len() {
        return Err(CodecError::corrupt(
            end,
            format!("{} trailing bytes after STOP", data.len() - end),
        ));
    }
    Ok(value)
}

/// Load every pickle stored back to back in `data`, in order.
pub fn load_all(data: &[u8]) -> CodecResult<Vec<Value>> {
    let mut values = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let (value, end) = load_from(data, pos)?;
        values.push(value);
        pos = end;
    }
    Ok(values)
}

/// Run one pickle starting at `start`. Returns the value and the offset
/// just past its `STOP`.
fn load_from(data: &[u8], start: usize) -> CodecResult<(Value, usize)> {
    let mut machine = Machine {
        data,
        pos: start,
        stack: Vec::new(),
        memo: HashMap::new(),
        live: HashMap::new(),
        shared: 0,
    };
    let value = machine.run()?;
    Ok((value, machine.pos))
}

/// A value on the stack, with its nesting depth and node count.
#[derive(Clone, Debug)]
struct Node {
    value: Value,
    depth: usize,
    size: usize,
}

impl Node {
    fn scalar(value: Value) -> Self {
        Self {
            value,
            depth: 0,
            size: 1,
        }
    }

    fn seq(at: usize, items: Vec<Node>, make: fn(Vec<Value>) -> Value) -> CodecResult<Self> {
        let depth = items.iter().map(|n| n.depth + 1).max().unwrap_or(0);
        check_depth(at, depth)?;
        let size = 1 + items.iter().map(|n| n.size).sum::<usize>();
        let value = make(items.into_iter().map(|n| n.value).collect());
        Ok(Self { value, depth, size })
    }

    fn append(&mut self, at: usize, items: Vec<Node>) -> CodecResult<()> {
        let kind = self.value.kind();
        let Value::List(list) = &mut self.value else {
            return Err(CodecError::corrupt(at, format!("cannot append to {kind}")));
        };
        for item in items {
            self.depth = self.depth.max(item.depth + 1);
            self.size += item.size;
            list.push(item.value);
        }
        check_depth(at, self.depth)
    }

    /// Insert pairs into a dict, a repeated key replacing the earlier value.
    fn set_items(&mut self, at: usize, pairs: Vec<(Node, Node)>) -> CodecResult<()> {
        let kind = self.value.kind();
        let Value::Dict(entries) = &mut self.value else {
            return Err(CodecError::corrupt(at, format!("cannot set items on {kind}")));
        };
        for (key, value) in pairs {
            if !key.value.is_hashable() {
                return Err(CodecError::corrupt(
                    at,
                    format!("unhashable {} used as dict key", key.value.kind()),
                ));
            }
            self.depth = self.depth.max(key.depth + 1).max(value.depth + 1);
            self.size += key.size + value.size;
            match entries.iter_mut().find(|(k, _)| *k == key.value) {
                Some(entry) => entry.1 = value.value,
                None => entries.push((key.value, value.value)),
            }
        }
        check_depth(at, self.depth)
    }
}

enum Item {
    Mark,
    Node(Node),
}

enum Memo {
    /// Still on the stack at this index and may still be filled in.
    Live(usize),
    Frozen(Node),
}

struct Machine<'a> {
    data: &'a [u8],
    pos: usize,
    stack: Vec<Item>,
    memo: HashMap<u32, Memo>,
    /// Stack index -> memo keys that refer to it while it is live.
    live: HashMap<usize, Vec<u32>>,
    shared: usize,
}

impl<'a> Machine<'a> {
    fn run(&mut self) -> CodecResult<Value> {
        let at = self.pos;
        if self.byte()? != op::PROTO {
            return Err(CodecError::corrupt(at, "pickle does not start with PROTO"));
        }
        self.protocol(at)?;

        loop {
            let at = self.pos;
            let opcode = self.byte()?;
            match opcode {
                op::STOP => return Ok(self.pop(at)?.value),
                op::PROTO => self.protocol(at)?,
                op::FRAME => {
                    let len = u64::from_le_bytes(self.array()?);
                    if len > self.remaining() as u64 {
                        return Err(CodecError::corrupt(
                            at,
                            format!("frame of {len} bytes, {} remain", self.remaining()),
                        ));
                    }
                }
                op::MARK => self.stack.push(Item::Mark),
                op::POP => {
                    self.pop_item(at)?;
                }
                op::POP_MARK => {
                    self.pop_to_mark(at)?;
                }
                op::DUP => {
                    let size = self.top(at)?.size;
                    self.charge(at, size)?;
                    let node = self.top(at)?.clone();
                    self.push(node);
                }

                op::NONE => self.push(Node::scalar(Value::None)),
                op::NEWTRUE => self.push(Node::scalar(Value::Bool(true))),
                op::NEWFALSE => self.push(Node::scalar(Value::Bool(false))),
                op::BININT => {
                    let n = i32::from_le_bytes(self.array()?);
                    self.push(Node::scalar(Value::Int(n.into())));
                }
                op::BININT1 => {
                    let n = self.byte()?;
                    self.push(Node::scalar(Value::Int(n.into())));
                }
                op::BININT2 => {
                    let n = u16::from_le_bytes(self.array()?);
                    self.push(Node::scalar(Value::Int(n.into())));
                }
                op::LONG1 => {
                    let len = self.byte()?;
                    let raw = self.take(len.into())?;
                    self.push(Node::scalar(Value::Int(long(raw)?)));
                }
                op::BINFLOAT => {
                    let x = f64::from_be_bytes(self.array()?);
                    self.push(Node::scalar(Value::Float(x)));
                }

                op::SHORT_BINUNICODE => {
                    let len = self.byte()?;
                    let s = self.string(len.into())?;
                    self.push(Node::scalar(Value::Str(s)));
                }
                op::BINUNICODE => {
                    let len = u32::from_le_bytes(self.array()?);
                    let s = self.string(u64::from(len))?;
                    self.push(Node::scalar(Value::Str(s)));
                }
                op::BINUNICODE8 => {
                    let len = u64::from_le_bytes(self.array()?);
                    let s = self.string(len)?;
                    self.push(Node::scalar(Value::Str(s)));
                }
                op::SHORT_BINBYTES => {
                    let len = self.byte()?;
                    let raw = self.take(len.into())?.to_vec();
                    self.push(Node::scalar(Value::Bytes(raw)));
                }
                op::BINBYTES => {
                    let len = u32::from_le_bytes(self.array()?);
                    let raw = self.take_u64(u64::from(len))?.to_vec();
                    self.push(Node::scalar(Value::Bytes(raw)));
                }
                op::BINBYTES8 => {
                    let len = u64::from_le_bytes(self.array()?);
                    let raw = self.take_u64(len)?.to_vec();
                    self.push(Node::scalar(Value::Bytes(raw)));
                }

                op::EMPTY_TUPLE => self.push(Node::seq(at, Vec::new(), Value::Tuple)?),
                op::TUPLE => {
                    let items = self.pop_to_mark(at)?;
                    self.push(Node::seq(at, items, Value::Tuple)?);
                }
                op::TUPLE1 | op::TUPLE2 | op::TUPLE3 => {
                    let items = self.pop_n(at, usize::from(opcode - op::TUPLE1) + 1)?;
                    self.push(Node::seq(at, items, Value::Tuple)?);
                }
                op::EMPTY_LIST => self.push(Node::seq(at, Vec::new(), Value::List)?),
                op::LIST => {
                    let items = self.pop_to_mark(at)?;
                    self.push(Node::seq(at, items, Value::List)?);
                }
                op::APPEND => {
                    let item = self.pop(at)?;
                    self.top(at)?.append(at, vec![item])?;
                }
                op::APPENDS => {
                    let items = self.pop_to_mark(at)?;
                    self.top(at)?.append(at, items)?;
                }
                op::EMPTY_DICT => self.push(Node::scalar(Value::Dict(Vec::new()))),
                op::DICT => {
                    let items = self.pop_to_mark(at)?;
                    let mut dict = Node::scalar(Value::Dict(Vec::new()));
                    dict.set_items(at, pairs(at, items)?)?;
                    self.push(dict);
                }
                op::SETITEM => {
                    let value = self.pop(at)?;
                    let key = self.pop(at)?;
                    self.top(at)?.set_items(at, vec![(key, value)])?;
                }
                op::SETITEMS => {
                    let items = self.pop_to_mark(at)?;
                    let pairs = pairs(at, items)?;
                    self.top(at)?.set_items(at, pairs)?;
                }

                op::MEMOIZE => {
                    let id = u32::try_from(self.memo.len())
                        .map_err(|_| CodecError::corrupt(at, "memo full"))?;
                    self.put(at, id)?;
                }
                op::BINPUT => {
                    let id = self.byte()?;
                    self.put(at, id.into())?;
                }
                op::LONG_BINPUT => {
                    let id = u32::from_le_bytes(self.array()?);
                    self.put(at, id)?;
                }
                op::BINGET => {
                    let id = self.byte()?;
                    self.get(at, id.into())?;
                }
                op::LONG_BINGET => {
                    let id = u32::from_le_bytes(self.array()?);
                    self.get(at, id)?;
                }

                other => {
                    return Err(CodecError::corrupt(
                        at,
                        format!("unsupported pickle opcode 0x{other:02x}"),
                    ));
                }
            }
        }
    }

    fn protocol(&mut self, at: usize) -> CodecResult<()> {
        let version = self.byte()?;
        if version > HIGHEST_PROTOCOL {
            return Err(CodecError::corrupt(
                at,
                format!("unsupported pickle protocol {version}"),
            ));
        }
        trace!(version, offset = at, "pickle protocol");
        Ok(())
    }

    // --- input ---

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn byte(&mut self) -> CodecResult<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| CodecError::corrupt(self.pos, "pickle ends without STOP"))?;
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

    fn take_u64(&mut self, len: u64) -> CodecResult<&'a [u8]> {
        let len = usize::try_from(len)
            .map_err(|_| CodecError::corrupt(self.pos, format!("length {len} out of range")))?;
        self.take(len)
    }

    fn array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let at = self.pos;
        self.take(N)?
            .try_into()
            .map_err(|_| CodecError::corrupt(at, "short read"))
    }

    fn string(&mut self, len: u64) -> CodecResult<String> {
        let at = self.pos;
        let raw = self.take_u64(len)?;
        String::from_utf8(raw.to_vec())
            .map_err(|e| CodecError::corrupt(at, format!("invalid UTF-8: {e}")))
    }

    // --- stack ---

    fn push(&mut self, node: Node) {
        self.stack.push(Item::Node(node));
    }

    fn top(&mut self, at: usize) -> CodecResult<&mut Node> {
        match self.stack.last_mut() {
            Some(Item::Node(node)) => Ok(node),
            Some(Item::Mark) => Err(CodecError::corrupt(at, "MARK where a value was expected")),
            None => Err(CodecError::corrupt(at, "stack underflow")),
        }
    }

    fn pop_item(&mut self, at: usize) -> CodecResult<Item> {
        let item = self
            .stack
            .pop()
            .ok_or_else(|| CodecError::corrupt(at, "stack underflow"))?;
        if let Item::Node(node) = &item {
            self.freeze(self.stack.len(), node);
        }
        Ok(item)
    }

    fn pop(&mut self, at: usize) -> CodecResult<Node> {
        match self.pop_item(at)? {
            Item::Node(node) => Ok(node),
            Item::Mark => Err(CodecError::corrupt(at, "MARK where a value was expected")),
        }
    }

    fn pop_n(&mut self, at: usize, n: usize) -> CodecResult<Vec<Node>> {
        let mut items = (0..n).map(|_| self.pop(at)).collect::<CodecResult<Vec<_>>>()?;
        items.reverse();
        Ok(items)
    }

    fn pop_to_mark(&mut self, at: usize) -> CodecResult<Vec<Node>> {
        let mark = self
            .stack
            .iter()
            .rposition(|item| matches!(item, Item::Mark))
            .ok_or_else(|| CodecError::corrupt(at, "no MARK on stack"))?;
        let items = self.pop_n(at, self.stack.len() - mark - 1)?;
        self.stack.pop();
        Ok(items)
    }

    // --- memo ---

    /// Containers are remembered by stack position until popped, so later
    /// appends are visible to lookups made while they are still open.
    fn put(&mut self, at: usize, id: u32) -> CodecResult<()> {
        let index = self.stack.len().saturating_sub(1);
        let entry = match self.stack.last() {
            Some(Item::Node(node)) if matches!(node.value, Value::List(_) | Value::Dict(_)) => {
                self.live.entry(index).or_default().push(id);
                Memo::Live(index)
            }
            Some(Item::Node(node)) => Memo::Frozen(node.clone()),
            Some(Item::Mark) => return Err(CodecError::corrupt(at, "cannot memoize MARK")),
            None => return Err(CodecError::corrupt(at, "stack underflow")),
        };
        self.memo.insert(id, entry);
        Ok(())
    }

    fn lookup(&self, at: usize, id: u32) -> CodecResult<&Node> {
        match self.memo.get(&id) {
            Some(Memo::Frozen(node)) => Ok(node),
            Some(Memo::Live(index)) => match self.stack.get(*index) {
                Some(Item::Node(node)) => Ok(node),
                _ => Err(CodecError::corrupt(at, format!("memo key {id} lost its value"))),
            },
            None => Err(CodecError::corrupt(at, format!("memo key {id} not defined"))),
        }
    }

    fn get(&mut self, at: usize, id: u32) -> CodecResult<()> {
        let size = self.lookup(at, id)?.size;
        self.charge(at, size)?;
        let node = self.lookup(at, id)?.clone();
        self.push(node);
        Ok(())
    }

    /// Snapshot memo entries that point at a stack slot being popped.
    fn freeze(&mut self, index: usize, node: &Node) {
        for id in self.live.remove(&index).unwrap_or_default() {
            if let Some(entry) = self.memo.get_mut(&id) {
                if matches!(entry, Memo::Live(i) if *i == index) {
                    *entry = Memo::Frozen(node.clone());
                }
            }
        }
    }

    fn charge(&mut self, at: usize, size: usize) -> CodecResult<()> {
        self.shared = self.shared.saturating_add(size);
        if self.shared > MAX_SHARED_NODES {
            return Err(CodecError::corrupt(
                at,
                format!("shared references expand past {MAX_SHARED_NODES} values"),
            ));
        }
        Ok(())
    }
}

fn check_depth(at: usize, depth: usize) -> CodecResult<()> {
    if depth > MAX_DEPTH {
        return Err(CodecError::corrupt(at, format!("nesting deeper than {MAX_DEPTH}")));
    }
    Ok(())
}

fn pairs(at: usize, items: Vec<Node>) -> CodecResult<Vec<(Node, Node)>> {
    if items.len() % 2 != 0 {
        return Err(CodecError::corrupt(at, "odd number of items for a dict"));
    }
    let mut pairs = Vec::with_capacity(items.len() / 2);
    let mut items = items.into_iter();
    while let (Some(key), Some(value)) = (items.next(), items.next()) {
        pairs.push((key, value));
    }
    Ok(pairs)
}

/// Little-endian two's complement, as written by `LONG1`.
fn long(raw: &[u8]) -> CodecResult<i64> {
    if raw.len() > 8 {
        return Err(CodecError::Unsupported {
            kind: ValueKind::Int,
            reason: format!("{}-byte integer is wider than 64 bits", raw.len()),
        });
    }
    let negative = raw.last().is_some_and(|b| b & 0x80 != 0);
    let mut buf = if negative { [0xFF; 8] } else { [0; 8] };
    buf[..raw.len()].copy_from_slice(raw);
    Ok(i64::from_le_bytes(buf))
}
