//! Versioned save records
//!
//! Each record on the host's serialization channel is laid out as:
//!
//! ```text
//! tag: [u8; 4] | version: u32 LE | length: u32 LE | payload: [u8; length]
//! ```
//!
//! The payload is LZ4-compressed JSON with the uncompressed size prepended
//! as a little-endian `u32`. The size is checked against a limit before the
//! output buffer is allocated.

use core::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{RecordError, RecordResult};

/// Current format version of every record
pub const RECORD_VERSION: u32 = 1;

/// Largest uncompressed payload accepted when reading
pub const MAX_UNCOMPRESSED_SIZE: usize = 64 * 1024 * 1024;

const HEADER_LEN: usize = 12;
const SIZE_HINT_LEN: usize = 4;

/// Record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordTag {
    /// Plugin list the save was written with
    LoadOrder,
    /// Collection membership and sightings
    Collections,
    /// Visited places
    Places,
    /// Party membership changes
    Party,
    /// Actors killed by the party
    Victims,
}

impl RecordTag {
    pub const ALL: [RecordTag; 5] = [
        RecordTag::LoadOrder,
        RecordTag::Collections,
        RecordTag::Places,
        RecordTag::Party,
        RecordTag::Victims,
    ];

    /// Four-byte tag as stored
    pub fn bytes(&self) -> [u8; 4] {
        match self {
            RecordTag::LoadOrder => *b"LORD",
            RecordTag::Collections => *b"COLL",
            RecordTag::Places => *b"PLAC",
            RecordTag::Party => *b"PRTY",
            RecordTag::Victims => *b"VCTM",
        }
    }

    /// Parse a stored tag
    pub fn from_bytes(bytes: [u8; 4]) -> RecordResult<RecordTag> {
        Self::ALL
            .iter()
            .copied()
            .find(|tag| tag.bytes() == bytes)
            .ok_or_else(|| RecordError::UnknownTag(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

impl fmt::Display for RecordTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes()))
    }
}

/// Serialize and compress a value
pub fn encode_payload<T: Serialize>(value: &T) -> RecordResult<Vec<u8>> {
    let json = serde_json::to_vec(value)?;
    Ok(lz4_flex::compress_prepend_size(&json))
}

/// Decompress and deserialize a payload, refusing size hints above `limit`
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8], limit: usize) -> RecordResult<T> {
    let hint = size_hint(payload)?;
    if hint > limit {
        return Err(RecordError::SizeHintExceeded { size: hint, limit });
    }
    let json = lz4_flex::decompress_size_prepended(payload).map_err(|e| RecordError::Compression(e.to_string()))?;
    Ok(serde_json::from_slice(&json)?)
}

/// Uncompressed size stored at the front of a payload
pub fn size_hint(payload: &[u8]) -> RecordResult<usize> {
    let bytes = take(payload, 0, SIZE_HINT_LEN)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize)
}

fn take(bytes: &[u8], at: usize, len: usize) -> RecordResult<&[u8]> {
    let available = bytes.len().saturating_sub(at);
    if available < len {
        return Err(RecordError::Truncated { needed: len, available });
    }
    Ok(&bytes[at..at + len])
}

fn read_u32(bytes: &[u8], at: usize) -> RecordResult<u32> {
    let b = take(bytes, at, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// One record read back from a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub tag: RecordTag,
    pub version: u32,
    pub payload: Vec<u8>,
}

impl Record {
    /// Encode a value as a current-version record
    pub fn encode<T: Serialize>(tag: RecordTag, value: &T) -> RecordResult<Self> {
        Ok(Self {
            tag,
            version: RECORD_VERSION,
            payload: encode_payload(value)?,
        })
    }

    /// Decode the payload, rejecting records from a newer format
    pub fn decode<T: DeserializeOwned>(&self, limit: usize) -> RecordResult<T> {
        if self.version > RECORD_VERSION {
            return Err(RecordError::VersionMismatch {
                tag: self.tag.to_string(),
                found: self.version,
                supported: RECORD_VERSION,
            });
        }
        decode_payload(&self.payload, limit)
    }
}

/// Host read/write channel for versioned records
pub trait RecordChannel {
    /// Append one record
    fn write_record(&mut self, tag: RecordTag, version: u32, payload: &[u8]) -> RecordResult<()>;

    /// Next record, `None` at the end. Records with an unknown tag are
    /// returned as [`RecordError::UnknownTag`] after being consumed.
    fn next_record(&mut self) -> RecordResult<Option<Record>>;
}

/// Channel over an in-memory byte buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordChannel {
    bytes: Vec<u8>,
    cursor: usize,
}

impl MemoryRecordChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from previously written bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes, cursor: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Start reading from the beginning again
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

impl RecordChannel for MemoryRecordChannel {
    fn write_record(&mut self, tag: RecordTag, version: u32, payload: &[u8]) -> RecordResult<()> {
        let length = u32::try_from(payload.len()).map_err(|_| RecordError::SizeHintExceeded {
            size: payload.len(),
            limit: u32::MAX as usize,
        })?;
        self.bytes.extend_from_slice(&tag.bytes());
        self.bytes.extend_from_slice(&version.to_le_bytes());
        self.bytes.extend_from_slice(&length.to_le_bytes());
        self.bytes.extend_from_slice(payload);
        Ok(())
    }

    fn next_record(&mut self) -> RecordResult<Option<Record>> {
        if self.cursor >= self.bytes.len() {
            return Ok(None);
        }
        let header = take(&self.bytes, self.cursor, HEADER_LEN)?;
        let tag = [header[0], header[1], header[2], header[3]];
        let version = read_u32(header, 4)?;
        let length = read_u32(header, 8)? as usize;
        let payload = take(&self.bytes, self.cursor + HEADER_LEN, length)?.to_vec();
        self.cursor += HEADER_LEN + length;

        let tag = RecordTag::from_bytes(tag)?;
        Ok(Some(Record { tag, version, payload }))
    }
}
