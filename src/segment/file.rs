//! Segment file
//!
//! One segment on disk plus its Active/Sealed mode.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{CaskError, Result};

use super::{segment_path, SegmentId, SegmentMode};

/// A single segment file
///
/// ## Concurrency:
/// - The handle, size and mode live behind one Mutex, so a seek+read never
///   interleaves with an append or a seal
/// - Reads of different segments proceed in parallel
#[derive(Debug)]
pub struct Segment {
    id: SegmentId,
    path: PathBuf,
    inner: Mutex<SegmentFile>,
}

#[derive(Debug)]
struct SegmentFile {
    file: File,
    size: u64,
    mode: SegmentMode,
}

impl Segment {
    /// Create a brand-new Active segment
    ///
    /// Fails if a file with this id already exists.
    pub fn create(dir: &Path, id: SegmentId) -> Result<Self> {
        let path = segment_path(dir, id);
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create_new(true)
            .open(&path)?;
        sync_dir(dir)?;

        debug!(segment_id = id, path = %path.display(), "created segment");

        Ok(Self {
            id,
            path,
            inner: Mutex::new(SegmentFile {
                file,
                size: 0,
                mode: SegmentMode::Active,
            }),
        })
    }

    /// Reopen an existing segment for further appends
    pub fn open_active(dir: &Path, id: SegmentId) -> Result<Self> {
        let path = segment_path(dir, id);
        let file = OpenOptions::new().read(true).append(true).open(&path)?;
        Self::from_file(id, path, file, SegmentMode::Active)
    }

    /// Reopen an existing segment read-only
    pub fn open_sealed(dir: &Path, id: SegmentId) -> Result<Self> {
        let path = segment_path(dir, id);
        let file = File::open(&path)?;
        Self::from_file(id, path, file, SegmentMode::Sealed)
    }

    fn from_file(id: SegmentId, path: PathBuf, file: File, mode: SegmentMode) -> Result<Self> {
        let size = file.metadata()?.len();
        Ok(Self {
            id,
            path,
            inner: Mutex::new(SegmentFile { file, size, mode }),
        })
    }

    /// Append `bytes` at end of file and sync them to stable storage
    ///
    /// Returns the offset the write started at. A successful return means the
    /// bytes are durable.
    pub fn append(&self, bytes: &[u8]) -> Result<u64> {
        let mut inner = self.inner.lock();

        if inner.mode == SegmentMode::Sealed {
            return Err(CaskError::Storage(format!(
                "cannot append to sealed segment {}",
                self.id
            )));
        }

        let offset = inner.size;
        let written = inner
            .file
            .write_all(bytes)
            .and_then(|()| inner.file.sync_data());

        if let Err(e) = written {
            self.rollback(&mut inner, offset);
            return Err(e.into());
        }

        inner.size += bytes.len() as u64;
        Ok(offset)
    }

    /// Undo a failed append by cutting the file back to `offset`
    ///
    /// The next record must start right where the failed one did, otherwise
    /// a scan would read the fragment's header and swallow the next record.
    /// If the cut fails too, the segment is sealed with the fragment as its
    /// last bytes; recovery drops an incomplete final frame.
    fn rollback(&self, inner: &mut SegmentFile, offset: u64) {
        let restored = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .and_then(|file| {
                file.set_len(offset)?;
                file.sync_data()
            });

        if let Err(e) = restored {
            inner.mode = SegmentMode::Sealed;
            warn!(
                segment_id = self.id,
                offset,
                error = %e,
                "could not roll back failed append, sealing segment"
            );
        }
    }

    /// Read exactly `len` bytes starting at `offset`
    ///
    /// A short read is an `Io` error (`UnexpectedEof`).
    pub fn read_at(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();

        let mut buf = vec![0u8; len as usize];
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.read_exact(&mut buf)?;

        Ok(buf)
    }

    /// Seal this segment: flush it and swap in a read-only handle
    ///
    /// Sealing an already sealed segment is a no-op.
    pub fn seal(&self) -> Result<()> {
        let mut inner = self.inner.lock();

        if inner.mode == SegmentMode::Sealed {
            return Ok(());
        }

        inner.file.sync_all()?;
        inner.file = File::open(&self.path)?;
        inner.mode = SegmentMode::Sealed;

        debug!(segment_id = self.id, size = inner.size, "sealed segment");
        Ok(())
    }

    /// Flush file contents and metadata
    pub fn sync(&self) -> Result<()> {
        let inner = self.inner.lock();
        if inner.mode == SegmentMode::Active {
            inner.file.sync_all()?;
        }
        Ok(())
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size in bytes
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    pub fn mode(&self) -> SegmentMode {
        self.inner.lock().mode
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

/// Make a newly created directory entry durable
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
