//! Tests for Segment files
//!
//! These tests verify:
//! - Creation and naming
//! - Append offsets and durability
//! - Positioned reads
//! - Sealing (one-way, idempotent, read-only afterwards)

use std::fs;

use caskkv::segment::{list_segment_ids, segment_path, Segment, SegmentMode};
use caskkv::CaskError;
use tempfile::TempDir;

// =============================================================================
// Naming Tests
// =============================================================================

#[test]
fn test_segment_path_format() {
    let temp = TempDir::new().unwrap();
    let path = segment_path(temp.path(), 42);

    assert_eq!(path.file_name().unwrap(), "0000000042.data");
}

#[test]
fn test_list_segment_ids_sorted_and_filtered() {
    let temp = TempDir::new().unwrap();

    for id in [3u64, 1, 2] {
        fs::write(segment_path(temp.path(), id), b"").unwrap();
    }
    fs::write(temp.path().join("notes.txt"), b"x").unwrap();
    fs::write(temp.path().join("abc.data"), b"x").unwrap();
    fs::create_dir(temp.path().join("0000000009.data")).unwrap();

    assert_eq!(list_segment_ids(temp.path()).unwrap(), vec![1, 2, 3]);
}

// =============================================================================
// Create Tests
// =============================================================================

#[test]
fn test_create_segment() {
    let temp = TempDir::new().unwrap();

    let segment = Segment::create(temp.path(), 1).unwrap();

    assert_eq!(segment.id(), 1);
    assert_eq!(segment.size(), 0);
    assert!(segment.is_empty());
    assert_eq!(segment.mode(), SegmentMode::Active);
    assert!(segment.path().exists());
}

#[test]
fn test_create_existing_segment_fails() {
    let temp = TempDir::new().unwrap();
    let _first = Segment::create(temp.path(), 1).unwrap();

    let result = Segment::create(temp.path(), 1);

    assert!(matches!(result, Err(CaskError::Io(_))));
}

#[test]
fn test_create_in_missing_directory_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope");

    assert!(matches!(
        Segment::create(&missing, 1),
        Err(CaskError::Io(_))
    ));
}

// =============================================================================
// Append / Read Tests
// =============================================================================

#[test]
fn test_append_returns_start_offsets() {
    let temp = TempDir::new().unwrap();
    let segment = Segment::create(temp.path(), 1).unwrap();

    assert_eq!(segment.append(b"hello").unwrap(), 0);
    assert_eq!(segment.append(b"world!").unwrap(), 5);
    assert_eq!(segment.size(), 11);

    assert_eq!(fs::read(segment.path()).unwrap(), b"helloworld!");
}

#[test]
fn test_read_at() {
    let temp = TempDir::new().unwrap();
    let segment = Segment::create(temp.path(), 1).unwrap();
    segment.append(b"helloworld").unwrap();

    assert_eq!(segment.read_at(0, 5).unwrap(), b"hello");
    assert_eq!(segment.read_at(5, 5).unwrap(), b"world");
    assert_eq!(segment.read_at(3, 0).unwrap(), b"");
}

#[test]
fn test_short_read_is_io_error() {
    let temp = TempDir::new().unwrap();
    let segment = Segment::create(temp.path(), 1).unwrap();
    segment.append(b"abc").unwrap();

    match segment.read_at(1, 10) {
        Err(CaskError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("expected Io(UnexpectedEof), got {:?}", other),
    }
}

#[test]
fn test_open_active_continues_at_end() {
    let temp = TempDir::new().unwrap();
    {
        let segment = Segment::create(temp.path(), 7).unwrap();
        segment.append(b"12345").unwrap();
    }

    let segment = Segment::open_active(temp.path(), 7).unwrap();

    assert_eq!(segment.size(), 5);
    assert_eq!(segment.append(b"678").unwrap(), 5);
    assert_eq!(segment.read_at(0, 8).unwrap(), b"12345678");
}

// =============================================================================
// Seal Tests
// =============================================================================

#[test]
fn test_seal_makes_segment_read_only() {
    let temp = TempDir::new().unwrap();
    let segment = Segment::create(temp.path(), 1).unwrap();
    segment.append(b"data").unwrap();

    segment.seal().unwrap();

    assert_eq!(segment.mode(), SegmentMode::Sealed);
    assert_eq!(segment.read_at(0, 4).unwrap(), b"data");
    assert!(matches!(
        segment.append(b"more"),
        Err(CaskError::Storage(_))
    ));
    assert_eq!(segment.size(), 4);
}

#[test]
fn test_seal_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let segment = Segment::create(temp.path(), 1).unwrap();

    segment.seal().unwrap();
    segment.seal().unwrap();

    assert_eq!(segment.mode(), SegmentMode::Sealed);
}

#[test]
fn test_open_sealed() {
    let temp = TempDir::new().unwrap();
    {
        let segment = Segment::create(temp.path(), 2).unwrap();
        segment.append(b"abc").unwrap();
    }

    let segment = Segment::open_sealed(temp.path(), 2).unwrap();

    assert_eq!(segment.mode(), SegmentMode::Sealed);
    assert_eq!(segment.size(), 3);
    assert_eq!(segment.read_at(0, 3).unwrap(), b"abc");
    assert!(segment.append(b"x").is_err());
}
