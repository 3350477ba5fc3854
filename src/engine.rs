//! Engine Module
//!
//! The storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Sequence codec → segment manager → key index for every write
//! - Define the durability contract: `put` returns after the record is synced
//! - Verify records on the read path
//! - Run crash recovery on startup

use std::fs;
use std::path::Path;

use parking_lot::Mutex;
use tracing::{info, trace};

use crate::config::Config;
use crate::error::{CaskError, Result};
use crate::keydir::{KeyDir, KeyDirEntry};
use crate::record::{self, HEADER_SIZE};
use crate::segment::{RecoveryResult, SegmentId, SegmentManager, SegmentRecovery};

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put): Serialized by `write_lock`
///   - Only ONE write at a time
///   - Holds write_lock across encode → rollover check → append → upsert
///
/// - **Reads** (get): No write_lock needed
///   - KeyDir lookup takes its internal read lock and copies the entry out
///   - Segment reads lock only the segment being read
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Segment files (Active + Sealed)
    segments: SegmentManager,

    /// Key → location of latest value
    keydir: KeyDir,

    /// Serializes write operations
    write_lock: Mutex<()>,

    /// What startup recovery found
    recovery: RecoveryResult,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate config, create data directory if allowed
    /// 2. Rebuild the key index from existing segments, truncating a torn tail
    /// 3. Open segments and pick (or create) the Active one
    /// 4. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Data directory
        if !config.data_dir.is_dir() {
            if !config.create_if_missing {
                return Err(CaskError::Config(format!(
                    "data directory {} does not exist",
                    config.data_dir.display()
                )));
            }
            fs::create_dir_all(&config.data_dir)?;
        }

        // Step 2: Recovery
        let keydir = KeyDir::new();
        let recovery = SegmentRecovery::recover(&config.data_dir, &keydir)?;

        // Step 3: Segments
        let segments = SegmentManager::open(&config.data_dir, config.max_segment_size)?;

        info!(
            data_dir = %config.data_dir.display(),
            segments = segments.segment_count(),
            active_segment = segments.active_id(),
            keys = keydir.len(),
            records_recovered = recovery.records_recovered,
            bytes_truncated = recovery.bytes_truncated,
            "engine opened"
        );

        Ok(Self {
            config,
            segments,
            keydir,
            write_lock: Mutex::new(()),
            recovery,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Validate sizes (no I/O on failure)
    /// 2. Acquire write lock
    /// 3. Encode the record
    /// 4. Roll over if the record would overflow the Active segment
    /// 5. Append and sync
    /// 6. Point the key index at the new value
    ///
    /// The index is only touched after a successful sync, so a failed put
    /// never changes what `get` returns.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        record::validate(key, value)?;

        let _write_guard = self.write_lock.lock();

        // Stamped under the lock so timestamps follow append order
        let encoded = record::encode(key, value)?;
        let frame_len = encoded.bytes.len() as u64;

        self.segments.maybe_rollover(frame_len)?;
        let (segment_id, offset) = self.segments.append(&encoded.bytes)?;

        let entry = KeyDirEntry {
            segment_id,
            value_offset: offset + (HEADER_SIZE + key.len()) as u64,
            value_len: encoded.value_len,
            timestamp: encoded.timestamp,
        };
        self.keydir.upsert(key.to_vec(), entry);

        trace!(segment_id, offset, frame_len, "put");
        Ok(())
    }

    /// Get a value by key
    ///
    /// Returns:
    /// - `Ok(Some(value))` — latest value for the key
    /// - `Ok(None)` — key was never written
    /// - `Err(CorruptRecord)` — the stored record failed verification
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let Some(entry) = self.keydir.lookup(key) else {
            return Ok(None);
        };

        // Read the whole frame so the checksum can be verified
        let offset = entry.record_offset(key.len())?;
        let frame = self
            .segments
            .read(entry.segment_id, offset, entry.record_len(key.len()))?;

        let record = record::decode(&frame)?;
        if record.key != key {
            return Err(CaskError::CorruptRecord(format!(
                "segment {} offset {} holds a different key",
                entry.segment_id, offset
            )));
        }

        Ok(Some(record.value))
    }

    /// Force the Active segment to disk
    pub fn sync(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.segments.sync()
    }

    /// Close the engine gracefully
    pub fn close(self) -> Result<()> {
        self.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        self.keydir.len()
    }

    /// Number of segment files (Active + Sealed)
    pub fn segment_count(&self) -> usize {
        self.segments.segment_count()
    }

    /// Id of the segment currently taking appends
    pub fn active_segment_id(&self) -> SegmentId {
        self.segments.active_id()
    }

    /// Ids of all segments, oldest first
    pub fn segment_ids(&self) -> Vec<SegmentId> {
        self.segments.segment_ids()
    }

    /// What recovery found when this engine was opened
    pub fn recovery_result(&self) -> &RecoveryResult {
        &self.recovery
    }
}
