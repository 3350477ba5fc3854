//! Error types for CaskKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::segment::SegmentId;

/// Result type alias using CaskError
pub type Result<T> = std::result::Result<T, CaskError>;

/// Unified error type for CaskKV operations
#[derive(Debug, Error)]
pub enum CaskError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Any filesystem failure, including a short positioned read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    /// Key or value exceeds its size bound (no I/O was attempted)
    #[error("Validation error: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Truncated record: expected {expected} bytes, found {actual}")]
    TruncatedRecord { expected: u64, actual: u64 },

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    /// The key index named a segment the segment manager does not know about
    #[error("Segment {0} not found")]
    SegmentNotFound(SegmentId),

    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CaskError {
    /// True for errors that describe damaged on-disk bytes
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            CaskError::CorruptRecord(_) | CaskError::TruncatedRecord { .. }
        )
    }
}
