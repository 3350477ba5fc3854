//! Record Module
//!
//! The on-disk unit of the log: one key/value pair, its creation time and a
//! checksum.
//!
//! ## Responsibilities
//! - Enforce key/value size bounds before any bytes are produced
//! - CRC32 checksums for corruption detection
//! - Fixed-size header so a record's length is known without scanning
//!
//! ## Frame Format (big-endian)
//! ```text
//! ┌─────────┬───────────────┬─────────────┬───────────────┬─────┬───────┐
//! │ CRC (4) │ Timestamp (8) │ KeySize (4) │ ValueSize (4) │ Key │ Value │
//! └─────────┴───────────────┴─────────────┴───────────────┴─────┴───────┘
//!           └──────────────────── covered by CRC ─────────────────────┘
//! ```

mod codec;

pub use codec::{
    decode, encode, encode_at, now_nanos, validate, EncodedRecord, Record, RecordHeader,
};

/// Header size: CRC (4) + Timestamp (8) + KeySize (4) + ValueSize (4) = 20 bytes
pub const HEADER_SIZE: usize = 20;

/// Largest accepted key (64 KiB)
pub const MAX_KEY_SIZE: usize = 64 * 1024;

/// Largest accepted value (1 MiB)
pub const MAX_VALUE_SIZE: usize = 1024 * 1024;
