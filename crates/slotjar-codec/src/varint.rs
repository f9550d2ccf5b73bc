use crate::error::{CodecError, CodecResult};

/// Encode a u64 as a little-endian base-128 varint.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a varint starting at `data[0]`. Returns (value, bytes_consumed).
///
/// `offset` is the absolute position of `data` and only feeds error reports.
pub(crate) fn decode_varint(data: &[u8], offset: usize) -> CodecResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        if shift >= 64 {
            return Err(CodecError::corrupt(offset, "varint overflow"));
        }
        // The tenth byte may only carry bit 63.
        if shift == 63 && byte & 0x7E != 0 {
            return Err(CodecError::corrupt(offset, "varint overflow"));
        }
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(CodecError::corrupt(offset, "truncated varint"))
}

pub(crate) fn zigzag(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

pub(crate) fn unzigzag(z: u64) -> i64 {
    ((z >> 1) as i64) ^ -((z & 1) as i64)
}
