use slotjar_value::Value;
use tracing::trace;

use crate::error::{CodecError, CodecResult};
use crate::payload;

/// Leading bytes of every blob.
pub const MAGIC: &[u8; 4] = b"SJAR";

/// Blob format version written by this build.
pub const FORMAT_VERSION: u16 = 1;

/// Frame header: magic, version, payload length, payload CRC32.
///
/// On-disk format (big-endian):
/// ```text
/// [4 bytes: magic "SJAR"]
/// [2 bytes: format version]
/// [4 bytes: payload length]
/// [4 bytes: CRC32 of payload]
/// [N bytes: tagged payload]
/// ```
pub const HEADER_LEN: usize = 14;

/// Parsed and validated frame header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u16,
    pub payload_len: u32,
    pub crc32: u32,
}

/// Encode a value and wrap it in a frame.
pub fn seal(value: &Value) -> CodecResult<Vec<u8>> {
    let body = payload::encode(value)?;
    let payload_len = u32::try_from(body.len()).map_err(|_| CodecError::Unsupported {
        kind: value.kind(),
        reason: format!("encoded size {} exceeds the 4 GiB frame limit", body.len()),
    })?;
    let crc = crc32fast::hash(&body);

    let mut blob = Vec::with_capacity(HEADER_LEN + body.len());
    blob.extend_from_slice(MAGIC);
    blob.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
    blob.extend_from_slice(&payload_len.to_be_bytes());
    blob.extend_from_slice(&crc.to_be_bytes());
    blob.extend_from_slice(&body);

    trace!(payload_len, crc, "sealed blob");
    Ok(blob)
}

/// Validate the frame and decode the value inside it.
pub fn open(blob: &[u8]) -> CodecResult<Value> {
    let header = inspect(blob)?;
    let body = &blob[HEADER_LEN..];
    let computed = crc32fast::hash(body);
    if computed != header.crc32 {
        return Err(CodecError::ChecksumMismatch {
            expected: header.crc32,
            computed,
        });
    }
    payload::decode(body)
}

/// Parse and validate the header without touching the payload checksum.
pub fn inspect(blob: &[u8]) -> CodecResult<FrameHeader> {
    if blob.len() < HEADER_LEN {
        return Err(CodecError::corrupt(
            0,
            format!("blob is {} bytes, shorter than the {HEADER_LEN}-byte header", blob.len()),
        ));
    }
    if &blob[0..4] != MAGIC {
        return Err(CodecError::InvalidMagic {
            expected: String::from_utf8_lossy(MAGIC).into(),
            actual: String::from_utf8_lossy(&blob[0..4]).into(),
        });
    }
    let version = u16::from_be_bytes([blob[4], blob[5]]);
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let payload_len = u32::from_be_bytes([blob[6], blob[7], blob[8], blob[9]]);
    let crc32 = u32::from_be_bytes([blob[10], blob[11], blob[12], blob[13]]);

    let actual = (blob.len() - HEADER_LEN) as u64;
    if actual != payload_len as u64 {
        return Err(CodecError::LengthMismatch {
            declared: payload_len as u64,
            actual,
        });
    }
    Ok(FrameHeader {
        version,
        payload_len,
        crc32,
    })
}
