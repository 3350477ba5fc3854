//! Segment Manager
//!
//! Owns every segment file and coordinates appends, rollover and reads.
//!
//! ## Responsibilities
//! - Discover existing segments on startup
//! - Keep exactly one Active segment
//! - Roll over before a record would overflow the Active segment
//! - Resolve a segment id to its handle for positioned reads

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{CaskError, Result};

use super::{list_segment_ids, Segment, SegmentId, SegmentMode};

/// Manages the segment files of one data directory
///
/// ## Concurrency:
/// - `segments` / `active`: RwLock, readers only clone an `Arc<Segment>` out
/// - `next_segment_id`: Atomic counter (lock-free)
/// - `maybe_rollover` and `append` must be serialized by the caller; the
///   Engine's writer lock does this
#[derive(Debug)]
pub struct SegmentManager {
    /// Directory where segments are stored
    dir: PathBuf,

    /// Rollover threshold in bytes
    max_segment_size: u64,

    /// The segment currently taking appends
    active: RwLock<Arc<Segment>>,

    /// Every open segment, Active and Sealed, by id
    segments: RwLock<BTreeMap<SegmentId, Arc<Segment>>>,

    /// Id for the next created segment
    next_segment_id: AtomicU64,
}

impl SegmentManager {
    /// Open the segments in `dir`
    ///
    /// On startup:
    /// 1. Discover existing segment files
    /// 2. Open all but the newest read-only (Sealed)
    /// 3. Reopen the newest for appends if it still has room, otherwise seal
    ///    it too
    /// 4. Create a fresh Active segment if none is left (empty directory, or
    ///    a crash between sealing and creating)
    ///
    /// Recovery (tail truncation) must already have run on `dir`.
    pub fn open(dir: &Path, max_segment_size: u64) -> Result<Self> {
        let ids = list_segment_ids(dir)?;

        let mut segments = BTreeMap::new();
        let mut active = None;

        if let Some((&newest, older)) = ids.split_last() {
            for &id in older {
                segments.insert(id, Arc::new(Segment::open_sealed(dir, id)?));
            }

            let segment = Arc::new(Segment::open_active(dir, newest)?);
            if segment.size() < max_segment_size {
                active = Some(Arc::clone(&segment));
            } else {
                segment.seal()?;
            }
            segments.insert(newest, segment);
        }

        // Next ID = max + 1, or 1 if no segments exist
        let next_id = ids.last().map(|&id| id + 1).unwrap_or(1);

        let manager = match active {
            Some(active) => Self::with_state(dir, max_segment_size, active, segments, next_id),
            None => {
                let fresh = Arc::new(Segment::create(dir, next_id)?);
                segments.insert(next_id, Arc::clone(&fresh));
                Self::with_state(dir, max_segment_size, fresh, segments, next_id + 1)
            }
        };

        debug!(
            dir = %dir.display(),
            segments = manager.segment_count(),
            active_segment = manager.active_id(),
            "segment manager opened"
        );

        Ok(manager)
    }

    fn with_state(
        dir: &Path,
        max_segment_size: u64,
        active: Arc<Segment>,
        segments: BTreeMap<SegmentId, Arc<Segment>>,
        next_id: SegmentId,
    ) -> Self {
        Self {
            dir: dir.to_path_buf(),
            max_segment_size,
            active: RwLock::new(active),
            segments: RwLock::new(segments),
            next_segment_id: AtomicU64::new(next_id),
        }
    }

    /// Create a new segment file with the next id and register it
    ///
    /// Does not change which segment is Active.
    pub fn create_segment(&self) -> Result<Arc<Segment>> {
        let id = self.next_segment_id.fetch_add(1, Ordering::SeqCst);
        let segment = Arc::new(Segment::create(&self.dir, id)?);

        self.segments.write().insert(id, Arc::clone(&segment));
        Ok(segment)
    }

    /// Roll over if a `next_record_size`-byte write would overflow the
    /// Active segment
    ///
    /// An empty Active segment is never rolled over: a record larger than the
    /// budget gets a segment to itself instead of leaving empty ones behind.
    /// An Active segment that is already Sealed (interrupted rollover) is
    /// always replaced.
    ///
    /// Returns whether a rollover happened.
    pub fn maybe_rollover(&self, next_record_size: u64) -> Result<bool> {
        let active = self.active();
        let size = active.size();

        let overflow = size > 0 && size + next_record_size > self.max_segment_size;
        let interrupted = active.mode() == SegmentMode::Sealed;
        if !overflow && !interrupted {
            return Ok(false);
        }

        active.seal()?;
        let fresh = self.create_segment()?;

        debug!(
            sealed_segment = active.id(),
            sealed_size = size,
            active_segment = fresh.id(),
            next_record_size,
            "rolled over"
        );

        *self.active.write() = fresh;
        Ok(true)
    }

    /// Append `bytes` to the Active segment
    ///
    /// Returns the segment id and the offset the write started at.
    pub fn append(&self, bytes: &[u8]) -> Result<(SegmentId, u64)> {
        let active = self.active();
        let offset = active.append(bytes)?;
        Ok((active.id(), offset))
    }

    /// Read exactly `len` bytes at `offset` from segment `id`
    pub fn read(&self, id: SegmentId, offset: u64, len: u64) -> Result<Vec<u8>> {
        let segment = self
            .segments
            .read()
            .get(&id)
            .cloned()
            .ok_or(CaskError::SegmentNotFound(id))?;

        segment.read_at(offset, len)
    }

    /// Flush the Active segment
    pub fn sync(&self) -> Result<()> {
        self.active().sync()
    }

    /// Handle of the Active segment
    pub fn active(&self) -> Arc<Segment> {
        self.active.read().clone()
    }

    pub fn active_id(&self) -> SegmentId {
        self.active.read().id()
    }

    pub fn active_size(&self) -> u64 {
        self.active.read().size()
    }

    /// Number of open segments (Active + Sealed)
    pub fn segment_count(&self) -> usize {
        self.segments.read().len()
    }

    /// Ids of all open segments, oldest first
    pub fn segment_ids(&self) -> Vec<SegmentId> {
        self.segments.read().keys().copied().collect()
    }

    pub fn max_segment_size(&self) -> u64 {
        self.max_segment_size
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Next id to be assigned (for testing/debugging)
    pub fn next_segment_id(&self) -> SegmentId {
        self.next_segment_id.load(Ordering::SeqCst)
    }
}
