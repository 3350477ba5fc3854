//! Tests for SegmentManager
//!
//! These tests verify:
//! - Opening empty and existing directories
//! - The single-Active-segment rule
//! - Rollover thresholds
//! - Reads across Active and Sealed segments

use std::fs;
use std::path::PathBuf;

use caskkv::segment::{segment_path, Segment, SegmentManager, SegmentMode};
use caskkv::CaskError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_empty_directory_creates_active_segment() {
    let (_temp, path) = setup_temp_dir();

    let manager = SegmentManager::open(&path, 1024).unwrap();

    assert_eq!(manager.segment_count(), 1);
    assert_eq!(manager.active_id(), 1);
    assert_eq!(manager.active_size(), 0);
    assert_eq!(manager.next_segment_id(), 2);
    assert_eq!(manager.active().mode(), SegmentMode::Active);
    assert!(segment_path(&path, 1).exists());
}

#[test]
fn test_open_existing_reuses_newest_segment() {
    let (_temp, path) = setup_temp_dir();
    {
        let manager = SegmentManager::open(&path, 1024).unwrap();
        manager.append(b"first").unwrap();
        manager.maybe_rollover(2000).unwrap();
        manager.append(b"second").unwrap();
        assert_eq!(manager.segment_ids(), vec![1, 2]);
    }

    let manager = SegmentManager::open(&path, 1024).unwrap();

    assert_eq!(manager.segment_ids(), vec![1, 2]);
    assert_eq!(manager.active_id(), 2);
    assert_eq!(manager.active_size(), 6);
    assert_eq!(manager.next_segment_id(), 3);
    assert_eq!(manager.read(1, 0, 5).unwrap(), b"first");
}

#[test]
fn test_open_full_newest_segment_starts_fresh() {
    let (_temp, path) = setup_temp_dir();
    {
        let segment = Segment::create(&path, 1).unwrap();
        segment.append(&[0u8; 64]).unwrap();
    }

    let manager = SegmentManager::open(&path, 64).unwrap();

    assert_eq!(manager.segment_ids(), vec![1, 2]);
    assert_eq!(manager.active_id(), 2);
    assert_eq!(manager.active_size(), 0);
}

#[test]
fn test_open_continues_ids_after_gap() {
    let (_temp, path) = setup_temp_dir();
    fs::write(segment_path(&path, 5), b"").unwrap();
    fs::write(segment_path(&path, 9), b"").unwrap();

    let manager = SegmentManager::open(&path, 1024).unwrap();

    assert_eq!(manager.active_id(), 9);
    assert_eq!(manager.next_segment_id(), 10);
}

// =============================================================================
// Rollover Tests
// =============================================================================

#[test]
fn test_no_rollover_within_budget() {
    let (_temp, path) = setup_temp_dir();
    let manager = SegmentManager::open(&path, 100).unwrap();
    manager.append(&[1u8; 60]).unwrap();

    // 60 + 40 == 100 fits exactly
    assert!(!manager.maybe_rollover(40).unwrap());
    assert_eq!(manager.active_id(), 1);
}

#[test]
fn test_rollover_when_budget_exceeded() {
    let (_temp, path) = setup_temp_dir();
    let manager = SegmentManager::open(&path, 100).unwrap();
    manager.append(&[1u8; 60]).unwrap();
    let old = manager.active();

    assert!(manager.maybe_rollover(41).unwrap());

    assert_eq!(manager.active_id(), 2);
    assert_eq!(manager.active_size(), 0);
    assert_eq!(old.mode(), SegmentMode::Sealed);
    assert_eq!(manager.segment_count(), 2);
}

#[test]
fn test_empty_active_segment_never_rolls_over() {
    let (_temp, path) = setup_temp_dir();
    let manager = SegmentManager::open(&path, 100).unwrap();

    assert!(!manager.maybe_rollover(500).unwrap());

    // The oversized record lands alone in segment 1
    manager.append(&[0u8; 500]).unwrap();
    assert!(manager.maybe_rollover(1).unwrap());
    assert_eq!(manager.active_id(), 2);
}

#[test]
fn test_sealed_active_segment_is_replaced() {
    let (_temp, path) = setup_temp_dir();
    let manager = SegmentManager::open(&path, 100).unwrap();

    // Simulate a rollover that sealed but never created a new segment
    manager.active().seal().unwrap();
    assert!(manager.append(b"x").is_err());

    assert!(manager.maybe_rollover(1).unwrap());
    assert_eq!(manager.active().mode(), SegmentMode::Active);
    assert_eq!(manager.append(b"x").unwrap(), (2, 0));
}

#[test]
fn test_create_segment_does_not_change_active() {
    let (_temp, path) = setup_temp_dir();
    let manager = SegmentManager::open(&path, 100).unwrap();

    let created = manager.create_segment().unwrap();

    assert_eq!(created.id(), 2);
    assert_eq!(manager.active_id(), 1);
    assert_eq!(manager.segment_count(), 2);
}

// =============================================================================
// Append / Read Tests
// =============================================================================

#[test]
fn test_append_reports_segment_and_offset() {
    let (_temp, path) = setup_temp_dir();
    let manager = SegmentManager::open(&path, 1024).unwrap();

    assert_eq!(manager.append(b"abc").unwrap(), (1, 0));
    assert_eq!(manager.append(b"defg").unwrap(), (1, 3));
    assert_eq!(manager.active_size(), 7);
}

#[test]
fn test_read_from_sealed_and_active() {
    let (_temp, path) = setup_temp_dir();
    let manager = SegmentManager::open(&path, 10).unwrap();

    manager.append(b"sealed-one").unwrap();
    manager.maybe_rollover(6).unwrap();
    manager.append(b"active").unwrap();

    assert_eq!(manager.read(1, 0, 10).unwrap(), b"sealed-one");
    assert_eq!(manager.read(2, 0, 6).unwrap(), b"active");
}

#[test]
fn test_read_unknown_segment() {
    let (_temp, path) = setup_temp_dir();
    let manager = SegmentManager::open(&path, 1024).unwrap();

    assert!(matches!(
        manager.read(99, 0, 1),
        Err(CaskError::SegmentNotFound(99))
    ));
}
