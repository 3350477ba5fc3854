//! Segment Recovery
//!
//! Rebuilds the key index from the segment files after a restart.

use std::fs::OpenOptions;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::error::{CaskError, Result};
use crate::keydir::{KeyDir, KeyDirEntry};

use super::{list_segment_ids, segment_path, SegmentId, SegmentScanner};

/// Handles recovery of a data directory
pub struct SegmentRecovery;

/// Result of a recovery or verification pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryResult {
    /// Number of segment files scanned
    pub segments_scanned: u64,

    /// Number of valid records found
    pub records_recovered: u64,

    /// Number of records rejected by checksum or header checks
    pub records_corrupted: u64,

    /// Bytes dropped from torn segment tails
    pub bytes_truncated: u64,

    /// Whether any segment had a torn tail
    pub was_truncated: bool,
}

impl SegmentRecovery {
    /// Recover a data directory into `keydir`
    ///
    /// This will:
    /// 1. Scan every segment, oldest first
    /// 2. Upsert each valid record into `keydir` (last write wins)
    /// 3. Truncate a torn tail (see below)
    ///
    /// What counts as a torn tail:
    /// - an incomplete last frame in any segment; only an append that failed
    ///   and was never acknowledged leaves one (a failed append whose rollback
    ///   also failed seals its segment with the fragment still attached)
    /// - a checksum failure in the last frame of the newest segment
    ///
    /// Any other damage, such as a corrupt record followed by more data or a
    /// corrupt frame in a sealed segment, is returned as an error: cutting
    /// there would throw away acknowledged records.
    pub fn recover(dir: &Path, keydir: &KeyDir) -> Result<RecoveryResult> {
        Self::scan(dir, Some(keydir), true)
    }

    /// Check a data directory without modifying it
    pub fn verify(dir: &Path) -> Result<RecoveryResult> {
        Self::scan(dir, None, false)
    }

    fn scan(dir: &Path, keydir: Option<&KeyDir>, repair: bool) -> Result<RecoveryResult> {
        let mut result = RecoveryResult::default();
        let ids = list_segment_ids(dir)?;
        let newest = ids.last().copied();

        for id in ids {
            let path = segment_path(dir, id);
            let mut scanner = SegmentScanner::open(&path)?;

            let damage = loop {
                match scanner.next_record() {
                    Ok(Some(scanned)) => {
                        result.records_recovered += 1;
                        if let Some(keydir) = keydir {
                            let entry = KeyDirEntry {
                                segment_id: id,
                                value_offset: scanned.value_offset(),
                                value_len: scanned.record.value.len() as u32,
                                timestamp: scanned.record.timestamp,
                            };
                            keydir.upsert(scanned.record.key, entry);
                        }
                    }
                    Ok(None) => break None,
                    Err(e) if e.is_corruption() => break Some(e),
                    Err(e) => return Err(e),
                }
            };
            result.segments_scanned += 1;

            let Some(err) = damage else { continue };

            let torn_tail = match err {
                CaskError::TruncatedRecord { .. } => true,
                CaskError::CorruptRecord(_) => Some(id) == newest && scanner.failed_at_tail(),
                _ => false,
            };
            if !torn_tail {
                return Err(err);
            }
            if matches!(err, CaskError::CorruptRecord(_)) {
                result.records_corrupted += 1;
            }

            let good_len = scanner.offset();
            let dropped = scanner.file_len() - good_len;
            result.bytes_truncated += dropped;
            result.was_truncated = true;

            warn!(
                segment_id = id,
                offset = good_len,
                dropped_bytes = dropped,
                error = %err,
                "torn tail in segment"
            );

            if repair {
                truncate_segment(dir, id, good_len)?;
            }
        }

        Ok(result)
    }
}

/// Cut a segment file back to `len` bytes
fn truncate_segment(dir: &Path, id: SegmentId, len: u64) -> Result<()> {
    let file = OpenOptions::new().write(true).open(segment_path(dir, id))?;
    file.set_len(len)?;
    file.sync_all()?;
    Ok(())
}
