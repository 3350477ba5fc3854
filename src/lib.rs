//! # CaskKV
//!
//! An embedded, log-structured key-value storage engine with:
//! - Append-only segment files with size-bounded rollover
//! - CRC32-checked records, verified on every read
//! - In-memory key index for O(1) lookups
//! - Crash recovery that rebuilds the index and trims torn writes
//! - Single-writer/multi-reader concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                               │
//! │               (put / get, writer lock)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────────┐
//!          │            │                 │
//!          ▼            ▼                 ▼
//!   ┌─────────────┐ ┌─────────────┐ ┌─────────────┐
//!   │   Record    │ │   Segment   │ │   KeyDir    │
//!   │   (Codec)   │ │  Manager    │ │  (RwLock)   │
//!   └─────────────┘ └──────┬──────┘ └─────────────┘
//!                          │
//!                          ▼
//!              ┌───────────────────────┐
//!              │ 0001.data  0002.data  │
//!              │ (sealed)   (active)   │
//!              └───────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use caskkv::{Config, Engine};
//!
//! let config = Config::builder()
//!     .data_dir("./data")
//!     .max_segment_size(16 * 1024 * 1024)
//!     .build();
//! let engine = Engine::open(config)?;
//!
//! engine.put(b"hello", b"world")?;
//! assert_eq!(engine.get(b"hello")?, Some(b"world".to_vec()));
//! # Ok::<(), caskkv::CaskError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod keydir;
pub mod segment;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CaskError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CaskKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
