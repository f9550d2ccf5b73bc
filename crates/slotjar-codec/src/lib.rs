//! Blob format for slotjar.
//!
//! A blob is a small fixed header followed by a tagged payload:
//!
//! - [`payload`]: exhaustive encode/decode over every `Value` kind, one tag
//!   byte per value, varint lengths and counts.
//! - [`frame`]: magic, format version, payload length and CRC32 around the
//!   payload, so truncated or damaged files are detected before decoding.
//!
//! [`pickle`] reads the plain-data subset of Python pickle streams into the
//! same `Value` model, so blobs written by Python can be inspected too.
//!
//! Decoding never panics on arbitrary input. Unencodable values surface as
//! [`CodecError::Unsupported`]; everything else is a corruption error
//! (see [`CodecError::is_corruption`]).

pub mod error;
pub mod frame;
pub mod payload;
pub mod pickle;
mod varint;

pub use error::{CodecError, CodecResult};
pub use frame::{inspect, open, seal, FrameHeader, FORMAT_VERSION, HEADER_LEN, MAGIC};
pub use payload::{decode, encode, peek_kind, MAX_DEPTH};
