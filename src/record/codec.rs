//! Record codec
//!
//! Encoding, decoding and checksum verification of record frames.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, BytesMut};
use crc32fast::Hasher;

use crate::error::{CaskError, Result};

use super::{HEADER_SIZE, MAX_KEY_SIZE, MAX_VALUE_SIZE};

/// A decoded record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Creation time (nanoseconds since the Unix epoch)
    pub timestamp: i64,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Record {
    /// Create a record stamped with the current wall-clock time
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            timestamp: now_nanos(),
            key,
            value,
        }
    }

    /// Encode this record into a frame
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_at(&self.key, &self.value, self.timestamp).map(|encoded| encoded.bytes)
    }

    /// Decode and verify a frame
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }

    /// Size of this record once encoded
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.key.len() + self.value.len()
    }
}

/// Output of [`encode`]: the frame plus what the caller needs to index it
#[derive(Debug, Clone)]
pub struct EncodedRecord {
    /// The full frame, header included
    pub bytes: Vec<u8>,
    /// Length of the value, needed to index the value inside the frame
    pub value_len: u32,
    /// Timestamp written into the header
    pub timestamp: i64,
}

/// Parsed fixed-size header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub crc: u32,
    pub timestamp: i64,
    pub key_size: u32,
    pub value_size: u32,
}

impl RecordHeader {
    /// Parse the header from the first `HEADER_SIZE` bytes of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(CaskError::TruncatedRecord {
                expected: HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        let mut buf = &bytes[..HEADER_SIZE];
        let header = Self {
            crc: buf.get_u32(),
            timestamp: buf.get_i64(),
            key_size: buf.get_u32(),
            value_size: buf.get_u32(),
        };

        // A header claiming sizes we would never have written is damage,
        // not a short file
        if header.key_size as usize > MAX_KEY_SIZE || header.value_size as usize > MAX_VALUE_SIZE
        {
            return Err(CaskError::CorruptRecord(format!(
                "header declares key_size={} value_size={} beyond limits",
                header.key_size, header.value_size
            )));
        }

        Ok(header)
    }

    /// Total frame length declared by this header
    pub fn frame_len(&self) -> u64 {
        HEADER_SIZE as u64 + self.key_size as u64 + self.value_size as u64
    }
}

/// Check key and value sizes against their bounds
pub fn validate(key: &[u8], value: &[u8]) -> Result<()> {
    if key.len() > MAX_KEY_SIZE {
        return Err(CaskError::Validation(format!(
            "key size {} exceeds maximum {}",
            key.len(),
            MAX_KEY_SIZE
        )));
    }
    if value.len() > MAX_VALUE_SIZE {
        return Err(CaskError::Validation(format!(
            "value size {} exceeds maximum {}",
            value.len(),
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}

/// Encode a record stamped with the current wall-clock time
pub fn encode(key: &[u8], value: &[u8]) -> Result<EncodedRecord> {
    encode_at(key, value, now_nanos())
}

/// Encode a record with an explicit timestamp
///
/// Format: [crc: u32][timestamp: i64][key_size: u32][value_size: u32][key][value]
pub fn encode_at(key: &[u8], value: &[u8], timestamp: i64) -> Result<EncodedRecord> {
    validate(key, value)?;

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + key.len() + value.len());

    // Reserve space for checksum (will be filled later)
    buf.put_u32(0);
    buf.put_i64(timestamp);
    buf.put_u32(key.len() as u32);
    buf.put_u32(value.len() as u32);
    buf.put_slice(key);
    buf.put_slice(value);

    let checksum = checksum(&buf[4..]);
    buf[0..4].copy_from_slice(&checksum.to_be_bytes());

    Ok(EncodedRecord {
        bytes: buf.to_vec(),
        value_len: value.len() as u32,
        timestamp,
    })
}

/// Decode one frame from the front of `bytes` and verify its checksum
///
/// Bytes past the end of the frame are ignored.
pub fn decode(bytes: &[u8]) -> Result<Record> {
    let header = RecordHeader::parse(bytes)?;

    let frame_len = header.frame_len();
    if (bytes.len() as u64) < frame_len {
        return Err(CaskError::TruncatedRecord {
            expected: frame_len,
            actual: bytes.len() as u64,
        });
    }

    let frame = &bytes[..frame_len as usize];
    let actual = checksum(&frame[4..]);
    if actual != header.crc {
        return Err(CaskError::CorruptRecord(format!(
            "checksum mismatch: stored {:#010x}, computed {:#010x}",
            header.crc, actual
        )));
    }

    let key_end = HEADER_SIZE + header.key_size as usize;
    Ok(Record {
        timestamp: header.timestamp,
        key: frame[HEADER_SIZE..key_end].to_vec(),
        value: frame[key_end..].to_vec(),
    })
}

/// Current wall-clock time in nanoseconds since the Unix epoch
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

fn checksum(body: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(body);
    hasher.finalize()
}
