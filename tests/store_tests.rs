//! Tests for the backing store
//!
//! These tests verify:
//! - Idempotent table provisioning
//! - Atomic put-if-absent and point get semantics
//! - Column-group enforcement
//! - Row-log durability across reopen and torn-tail trimming
//! - Batched range scans, scanner permits, and the connection pool

use std::fs::OpenOptions;
use std::io::Write;

use bytes::Bytes;
use photostore::key::ScanRange;
use photostore::store::{Row, Store};
use photostore::{Config, ProvisionError, StoreError};
use tempfile::TempDir;

const GROUP: &str = "cf";

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config(dir: &TempDir) -> Config {
    Config::builder().data_dir(dir.path()).build()
}

fn setup_store() -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(test_config(&dir)).unwrap();
    (dir, store)
}

fn sample_row(marker: &str) -> Row {
    let mut row = Row::new();
    row.set(GROUP, "value", Bytes::copy_from_slice(marker.as_bytes()));
    row
}

// =============================================================================
// Provisioning
// =============================================================================

#[test]
fn test_ensure_table_creates_and_is_idempotent() {
    let (_dir, store) = setup_store();
    let admin = store.admin();

    assert!(!admin.table_exists("photos"));
    admin.ensure_table("photos", &[GROUP]).unwrap();
    assert!(admin.table_exists("photos"));

    // Second call is a no-op
    admin.ensure_table("photos", &[GROUP]).unwrap();
    assert!(admin.table_exists("photos"));
}

#[test]
fn test_ensure_table_rejects_bad_specs() {
    let (_dir, store) = setup_store();
    let admin = store.admin();

    assert!(matches!(
        admin.ensure_table("", &[GROUP]),
        Err(ProvisionError::Invalid(_))
    ));
    assert!(matches!(
        admin.ensure_table("photos", &[]),
        Err(ProvisionError::Invalid(_))
    ));
}

#[test]
fn test_unprovisioned_table_is_unavailable() {
    let (_dir, store) = setup_store();

    assert!(matches!(
        store.connect("nowhere"),
        Err(StoreError::Unavailable(_))
    ));
    assert!(matches!(
        store.pool("nowhere"),
        Err(StoreError::Unavailable(_))
    ));
}

// =============================================================================
// Put / Get
// =============================================================================

#[test]
fn test_put_if_absent_reports_existing_rows() {
    let (_dir, store) = setup_store();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();
    let conn = store.connect("photos").unwrap();

    assert!(conn.put_if_absent(b"key-1", sample_row("first")).unwrap());
    assert!(!conn.put_if_absent(b"key-1", sample_row("second")).unwrap());

    // The original row is untouched
    let row = conn.get(b"key-1").unwrap().unwrap();
    assert_eq!(row.get(GROUP, "value").unwrap().as_ref(), b"first");
}

#[test]
fn test_put_overwrites() {
    let (_dir, store) = setup_store();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();
    let conn = store.connect("photos").unwrap();

    conn.put(b"key-1", sample_row("first")).unwrap();
    conn.put(b"key-1", sample_row("second")).unwrap();

    let row = conn.get(b"key-1").unwrap().unwrap();
    assert_eq!(row.get(GROUP, "value").unwrap().as_ref(), b"second");
}

#[test]
fn test_get_missing_row() {
    let (_dir, store) = setup_store();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();

    let conn = store.connect("photos").unwrap();
    assert!(conn.get(b"absent").unwrap().is_none());
}

#[test]
fn test_unknown_column_group_rejected() {
    let (_dir, store) = setup_store();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();
    let conn = store.connect("photos").unwrap();

    let mut row = Row::new();
    row.set("mystery", "value", Bytes::from_static(b"x"));

    assert!(matches!(
        conn.put(b"key-1", row),
        Err(StoreError::InvalidKey(_))
    ));
}

// =============================================================================
// Durability
// =============================================================================

#[test]
fn test_rows_survive_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let store = Store::open(test_config(&dir)).unwrap();
        store.admin().ensure_table("photos", &[GROUP]).unwrap();
        let conn = store.connect("photos").unwrap();
        conn.put(b"key-a", sample_row("a")).unwrap();
        conn.put(b"key-b", sample_row("b")).unwrap();
    }

    let store = Store::open(test_config(&dir)).unwrap();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();
    let conn = store.connect("photos").unwrap();

    let row = conn.get(b"key-a").unwrap().unwrap();
    assert_eq!(row.get(GROUP, "value").unwrap().as_ref(), b"a");
    let row = conn.get(b"key-b").unwrap().unwrap();
    assert_eq!(row.get(GROUP, "value").unwrap().as_ref(), b"b");
}

#[test]
fn test_torn_log_tail_is_trimmed() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("photos.log");

    {
        let store = Store::open(test_config(&dir)).unwrap();
        store.admin().ensure_table("photos", &[GROUP]).unwrap();
        let conn = store.connect("photos").unwrap();
        conn.put(b"key-a", sample_row("a")).unwrap();
    }

    // Simulate a crash mid-append: garbage after the last complete frame
    let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
    file.write_all(&[0xDE, 0xAD, 0xBE]).unwrap();
    drop(file);

    let store = Store::open(test_config(&dir)).unwrap();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();
    let conn = store.connect("photos").unwrap();

    // The complete frame survived the torn tail
    assert!(conn.get(b"key-a").unwrap().is_some());

    // And appends after the trim survive another reopen
    conn.put(b"key-b", sample_row("b")).unwrap();
    drop(conn);
    drop(store);

    let store = Store::open(test_config(&dir)).unwrap();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();
    let conn = store.connect("photos").unwrap();
    assert!(conn.get(b"key-a").unwrap().is_some());
    assert!(conn.get(b"key-b").unwrap().is_some());
}

// =============================================================================
// Scans
// =============================================================================

#[test]
fn test_scan_walks_range_in_order() {
    let (_dir, store) = setup_store();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();
    let conn = store.connect("photos").unwrap();

    for i in (0..7u8).rev() {
        conn.put(&[i], sample_row(&format!("row-{i}"))).unwrap();
    }

    // Batch size smaller than the row count forces several fetches
    let mut scan = conn.open_scan(ScanRange::all(), 2).unwrap();
    let mut keys = Vec::new();
    while let Some((key, _row)) = scan.next_row().unwrap() {
        keys.push(key);
    }

    assert_eq!(keys, (0..7u8).map(|i| vec![i]).collect::<Vec<_>>());
    assert!(scan.is_closed());
    assert_eq!(conn.open_scan_count(), 0);
}

#[test]
fn test_scan_respects_range_bounds() {
    let (_dir, store) = setup_store();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();
    let conn = store.connect("photos").unwrap();

    for i in 0..10u8 {
        conn.put(&[i], sample_row("r")).unwrap();
    }

    let range = ScanRange {
        start: vec![3],
        end: Some(vec![7]),
    };
    let mut scan = conn.open_scan(range, 64).unwrap();
    let mut keys = Vec::new();
    while let Some((key, _)) = scan.next_row().unwrap() {
        keys.push(key);
    }

    // Half-open: start included, end excluded
    assert_eq!(keys, vec![vec![3], vec![4], vec![5], vec![6]]);
}

#[test]
fn test_scanner_permit_cap_and_release() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(dir.path()).max_open_scans(1).build();
    let store = Store::open(config).unwrap();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();
    let conn = store.connect("photos").unwrap();
    conn.put(b"key-a", sample_row("a")).unwrap();

    let scan = conn.open_scan(ScanRange::all(), 64).unwrap();
    assert_eq!(conn.open_scan_count(), 1);

    // Slot is taken
    assert!(matches!(
        conn.open_scan(ScanRange::all(), 64),
        Err(StoreError::Unavailable(_))
    ));

    // Dropping the scan mid-flight frees the slot immediately
    drop(scan);
    assert_eq!(conn.open_scan_count(), 0);
    conn.open_scan(ScanRange::all(), 64).unwrap();
}

#[test]
fn test_closed_scan_reports_exhaustion() {
    let (_dir, store) = setup_store();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();
    let conn = store.connect("photos").unwrap();
    conn.put(b"key-a", sample_row("a")).unwrap();

    let mut scan = conn.open_scan(ScanRange::all(), 64).unwrap();
    scan.close();

    // Non-restartable: nothing comes back after close
    assert!(scan.next_row().unwrap().is_none());
}

// =============================================================================
// Connection Pool
// =============================================================================

#[test]
fn test_pool_returns_connections_on_drop() {
    let (_dir, store) = setup_store();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();
    let pool = store.pool("photos").unwrap();

    assert_eq!(pool.idle_count(), 0);
    {
        let conn = pool.get();
        conn.put(b"key-a", sample_row("a")).unwrap();
    }
    assert_eq!(pool.idle_count(), 1);

    // The parked connection is reused
    let conn = pool.get();
    assert_eq!(pool.idle_count(), 0);
    assert!(conn.get(b"key-a").unwrap().is_some());
}

#[test]
fn test_pool_grows_under_concurrent_checkout() {
    let (_dir, store) = setup_store();
    store.admin().ensure_table("photos", &[GROUP]).unwrap();
    let pool = store.pool("photos").unwrap();

    let c1 = pool.get();
    let c2 = pool.get();
    c1.put(b"key-a", sample_row("a")).unwrap();
    assert!(c2.get(b"key-a").unwrap().is_some());
}
