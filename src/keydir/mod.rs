//! KeyDir Module
//!
//! In-memory index from key to the on-disk location of its latest value.
//!
//! ## Responsibilities
//! - O(1) lookup of a key's location, no segment scan
//! - Last-write-wins: the caller's upsert order is authoritative
//! - Many concurrent readers, one writer
//!
//! Older records for an overwritten key stay on disk but have no entry here,
//! which makes them unreachable.

mod table;

pub use table::KeyDir;

use crate::error::{CaskError, Result};
use crate::record::HEADER_SIZE;
use crate::segment::SegmentId;

/// Location of a key's latest value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDirEntry {
    /// Segment holding the record
    pub segment_id: SegmentId,

    /// Byte offset of the value (not the record) within the segment
    pub value_offset: u64,

    /// Length of the value in bytes
    pub value_len: u32,

    /// Timestamp of the owning record
    pub timestamp: i64,
}

impl KeyDirEntry {
    /// Offset of the owning record's first byte
    pub fn record_offset(&self, key_len: usize) -> Result<u64> {
        self.value_offset
            .checked_sub((HEADER_SIZE + key_len) as u64)
            .ok_or_else(|| {
                CaskError::CorruptRecord(format!(
                    "index entry value_offset {} too small for a {}-byte key",
                    self.value_offset, key_len
                ))
            })
    }

    /// Length of the owning record's frame
    pub fn record_len(&self, key_len: usize) -> u64 {
        (HEADER_SIZE + key_len) as u64 + self.value_len as u64
    }
}
