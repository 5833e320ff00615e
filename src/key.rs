//! Key codec
//!
//! Pure functions mapping (entity identity, timestamp) to fixed-width
//! sortable row keys, plus the scan-range boundaries for a photo's comments.
//!
//! ## Key Layout
//!
//! ```text
//! Photo key (24 bytes):
//! ┌──────────────────────────┬──────────────────────────┐
//! │ inverted timestamp (8)   │ content hash (16)        │
//! │ big-endian               │ MD5 digest               │
//! └──────────────────────────┴──────────────────────────┘
//!
//! Comment key (24 bytes):
//! ┌──────────────────────────┬──────────────────────────┐
//! │ photo content hash (16)  │ inverted timestamp (8)   │
//! │ MD5 digest               │ big-endian               │
//! └──────────────────────────┴──────────────────────────┘
//! ```
//!
//! The inverted timestamp is `u64::MAX - t`, so ascending byte order equals
//! descending chronological order: a full-table photo scan and a per-photo
//! comment scan are both newest-first with no secondary index. Leading the
//! comment key with the hash keeps one photo's comments contiguous.
//!
//! Keys are never decoded; identity is carried in the record payload.

use crate::error::{Result, StoreError};

// =============================================================================
// Widths
// =============================================================================

/// Content hash width in bytes (128-bit MD5 digest)
pub const HASH_WIDTH: usize = 16;

/// Timestamp width in bytes (u64 unix millis, big-endian)
pub const TIMESTAMP_WIDTH: usize = 8;

/// Photo key width: inverted timestamp + hash
pub const PHOTO_KEY_WIDTH: usize = TIMESTAMP_WIDTH + HASH_WIDTH;

/// Comment key width: hash + inverted timestamp
pub const COMMENT_KEY_WIDTH: usize = HASH_WIDTH + TIMESTAMP_WIDTH;

// =============================================================================
// Encoding
// =============================================================================

/// Invert a timestamp so byte order sorts newest-first
pub fn invert_timestamp(at: u64) -> u64 {
    u64::MAX - at
}

/// Encode a photo row key: inverted timestamp, then content hash
///
/// Fails with `InvalidKey` unless the hash is exactly [`HASH_WIDTH`] bytes.
pub fn encode_photo_key(hash: &[u8], at: u64) -> Result<[u8; PHOTO_KEY_WIDTH]> {
    check_hash_width(hash)?;

    let mut key = [0u8; PHOTO_KEY_WIDTH];
    key[..TIMESTAMP_WIDTH].copy_from_slice(&invert_timestamp(at).to_be_bytes());
    key[TIMESTAMP_WIDTH..].copy_from_slice(hash);
    Ok(key)
}

/// Encode a comment row key: photo content hash, then inverted timestamp
///
/// Fails with `InvalidKey` unless the hash is exactly [`HASH_WIDTH`] bytes.
pub fn encode_comment_key(photo_hash: &[u8], at: u64) -> Result<[u8; COMMENT_KEY_WIDTH]> {
    check_hash_width(photo_hash)?;

    let mut key = [0u8; COMMENT_KEY_WIDTH];
    key[..HASH_WIDTH].copy_from_slice(photo_hash);
    key[HASH_WIDTH..].copy_from_slice(&invert_timestamp(at).to_be_bytes());
    Ok(key)
}

/// Hash width is a checked precondition at every encode call
fn check_hash_width(hash: &[u8]) -> Result<()> {
    if hash.len() != HASH_WIDTH {
        return Err(StoreError::InvalidKey(format!(
            "hash must be exactly {HASH_WIDTH} bytes, got {}",
            hash.len()
        )));
    }
    Ok(())
}

// =============================================================================
// Scan Ranges
// =============================================================================

/// A half-open `[start, end)` range of row keys
///
/// `end == None` means the range is unbounded above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRange {
    pub start: Vec<u8>,
    pub end: Option<Vec<u8>>,
}

impl ScanRange {
    /// The full table
    pub fn all() -> Self {
        Self {
            start: Vec::new(),
            end: None,
        }
    }

    /// Whether `key` falls inside this range
    pub fn contains(&self, key: &[u8]) -> bool {
        if key < self.start.as_slice() {
            return false;
        }
        match &self.end {
            Some(end) => key < end.as_slice(),
            None => true,
        }
    }
}

/// Scan range covering every comment key for one photo, newest first
///
/// Comments share the photo hash as key prefix, so the range is
/// `[hash ++ 0u64, successor(hash))`, contiguous and exclusive to that hash.
pub fn comment_range(photo_hash: &[u8]) -> Result<ScanRange> {
    check_hash_width(photo_hash)?;

    let mut start = Vec::with_capacity(COMMENT_KEY_WIDTH);
    start.extend_from_slice(photo_hash);
    start.extend_from_slice(&[0u8; TIMESTAMP_WIDTH]);

    Ok(ScanRange {
        start,
        end: prefix_successor(photo_hash),
    })
}

/// Smallest byte string ordering after every key that starts with `prefix`
///
/// Increments the prefix with carry, dropping trailing 0xFF bytes. An
/// all-0xFF prefix has no successor: the range is unbounded above.
fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut successor = prefix.to_vec();
    while let Some(last) = successor.last_mut() {
        if *last == 0xFF {
            successor.pop();
        } else {
            *last += 1;
            return Some(successor);
        }
    }
    None
}
