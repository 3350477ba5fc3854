//! Segment Module
//!
//! Append-only segment files and their lifecycle.
//!
//! ## Responsibilities
//! - Create segment files with strictly increasing ids
//! - Exactly one Active segment; every other segment is Sealed (read-only)
//! - Roll over before a write would push the Active segment past its budget
//! - Positioned reads for index lookups, sequential scans for recovery
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   ├── 0000000001.data   Sealed
//!   ├── 0000000002.data   Sealed
//!   └── 0000000003.data   Active
//! ```
//! Each file is records back to back (see [`crate::record`]); there is no
//! file header or footer.
//!
//! ## Lifecycle
//! ```text
//!   create ──▶ Active ──seal──▶ Sealed
//! ```

mod file;
mod manager;
mod recovery;
mod scanner;

use std::fs;
use std::path::{Path, PathBuf};

pub use file::Segment;
pub use manager::SegmentManager;
pub use recovery::{RecoveryResult, SegmentRecovery};
pub use scanner::{ScannedRecord, SegmentScanner};

use crate::error::Result;

/// Identity of a segment; higher ids were created later
pub type SegmentId = u64;

/// Extension of segment files
pub const SEGMENT_EXTENSION: &str = "data";

/// Mode of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    /// Open for appends
    Active,

    /// Closed to writes, read-only for the rest of the process
    Sealed,
}

/// File path of segment `id` inside `dir`
/// 42 → "{dir}/0000000042.data"
pub fn segment_path(dir: &Path, id: SegmentId) -> PathBuf {
    dir.join(format!("{:010}.{}", id, SEGMENT_EXTENSION))
}

/// Ids of every segment file in `dir`, oldest first
pub fn list_segment_ids(dir: &Path) -> Result<Vec<SegmentId>> {
    let mut ids = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            if let Some(id) = parse_segment_id(&path) {
                ids.push(id);
            }
        }
    }

    ids.sort_unstable();
    Ok(ids)
}

/// "0000000042.data" → Some(42)
fn parse_segment_id(path: &Path) -> Option<SegmentId> {
    if path.extension()? != SEGMENT_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}
