//! Segment Scanner
//!
//! Sequential reader over the records of one segment file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{CaskError, Result};
use crate::record::{self, Record, RecordHeader, HEADER_SIZE};

/// A record found by the scanner, with its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    /// Offset of the record's first byte
    pub offset: u64,
    /// Frame length
    pub len: u64,
    pub record: Record,
}

impl ScannedRecord {
    /// Offset of the value inside the segment
    pub fn value_offset(&self) -> u64 {
        self.offset + (HEADER_SIZE + self.record.key.len()) as u64
    }
}

/// Reads records front to back
///
/// On error the scanner does not advance: `offset()` stays at the end of the
/// last good record, which is where a damaged tail begins.
pub struct SegmentScanner {
    reader: BufReader<File>,
    /// End of the last good record
    offset: u64,
    file_len: u64,
    /// Declared length of a frame whose header parsed but whose body failed
    failed_frame_len: Option<u64>,
    failed: bool,
}

impl SegmentScanner {
    /// Open a segment file for scanning
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            offset: 0,
            file_len,
            failed_frame_len: None,
            failed: false,
        })
    }

    /// Read the next record
    ///
    /// Returns:
    /// - `Ok(Some(record))` — a verified record
    /// - `Ok(None)` — clean end of file
    /// - `Err(TruncatedRecord)` — fewer bytes left than the record needs
    /// - `Err(CorruptRecord)` — impossible header or checksum mismatch
    pub fn next_record(&mut self) -> Result<Option<ScannedRecord>> {
        let remaining = self.file_len - self.offset;
        if remaining == 0 {
            return Ok(None);
        }

        if remaining < HEADER_SIZE as u64 {
            return Err(CaskError::TruncatedRecord {
                expected: HEADER_SIZE as u64,
                actual: remaining,
            });
        }

        let mut frame = vec![0u8; HEADER_SIZE];
        self.reader.read_exact(&mut frame)?;

        // Header sizes are bounds-checked here, before the body is allocated
        let header = RecordHeader::parse(&frame)?;
        let frame_len = header.frame_len();
        self.failed_frame_len = Some(frame_len);
        if remaining < frame_len {
            return Err(CaskError::TruncatedRecord {
                expected: frame_len,
                actual: remaining,
            });
        }

        frame.resize(frame_len as usize, 0);
        self.reader.read_exact(&mut frame[HEADER_SIZE..])?;

        let record = record::decode(&frame)?;
        let scanned = ScannedRecord {
            offset: self.offset,
            len: frame_len,
            record,
        };

        self.offset += frame_len;
        self.failed_frame_len = None;
        Ok(Some(scanned))
    }

    /// End of the last good record
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// True when the record that just failed to read is the last thing in
    /// the file: its declared frame reaches (or runs past) end of file
    ///
    /// A frame whose header could not be parsed has no known extent and is
    /// never considered the tail.
    pub fn failed_at_tail(&self) -> bool {
        self.failed_frame_len
            .is_some_and(|len| self.offset + len >= self.file_len)
    }

    /// Length of the file when the scanner was opened
    pub fn file_len(&self) -> u64 {
        self.file_len
    }
}

impl Iterator for SegmentScanner {
    type Item = Result<ScannedRecord>;

    /// Yields records until end of file or the first error
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
