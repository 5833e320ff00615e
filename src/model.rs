//! Domain records: photos and their threaded comments

use std::fmt;

use bytes::Bytes;
use md5::{Digest, Md5};

use crate::error::{Result, StoreError};
use crate::key::{self, HASH_WIDTH, PHOTO_KEY_WIDTH};

// =============================================================================
// Content Hash
// =============================================================================

/// 128-bit content digest serving as a photo's logical identity
///
/// Always derived from the photo contents, never user-supplied: two uploads
/// with identical contents produce the same hash. The hex form is the
/// human-visible identity used in URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; HASH_WIDTH]);

impl ContentHash {
    /// Digest the given contents
    pub fn of(contents: &[u8]) -> Self {
        let mut hasher = Md5::new();
        hasher.update(contents);
        Self(hasher.finalize().into())
    }

    /// Reconstruct a hash from its raw bytes
    ///
    /// Fails with `InvalidKey` unless exactly [`HASH_WIDTH`] bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; HASH_WIDTH] = bytes.try_into().map_err(|_| {
            StoreError::InvalidKey(format!(
                "content hash must be {HASH_WIDTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    /// Parse the 32-char lowercase hex rendering
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| StoreError::InvalidKey(format!("bad hex content hash: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Hex rendering for URLs and logs
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// =============================================================================
// Photo
// =============================================================================

/// A stored photo: title, contents, creation instant, derived identity
///
/// Rows are created once and immutable thereafter; there is no update or
/// delete. The row key mixes the creation instant with the content hash, so
/// identical contents uploaded at different instants occupy different rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    hash: ContentHash,
    title: String,
    contents: Bytes,
    created_at: u64,
}

impl Photo {
    /// Build a photo, deriving its identity from the contents
    ///
    /// `created_at` is unix millis.
    pub fn new(title: impl Into<String>, contents: impl Into<Bytes>, created_at: u64) -> Self {
        let contents = contents.into();
        let hash = ContentHash::of(&contents);
        Self {
            hash,
            title: title.into(),
            contents,
            created_at,
        }
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn contents(&self) -> &Bytes {
        &self.contents
    }

    /// Creation instant in unix millis
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// This photo's row key
    pub fn key(&self) -> [u8; PHOTO_KEY_WIDTH] {
        // The hash is typed at HASH_WIDTH, so encoding cannot fail here
        match key::encode_photo_key(self.hash.as_bytes(), self.created_at) {
            Ok(k) => k,
            Err(_) => unreachable!("typed hash has fixed width"),
        }
    }
}

// =============================================================================
// Comment
// =============================================================================

/// A comment on a photo
///
/// The stored form keeps only the parent photo's encoded row key: a
/// reference, not an owning pointer. The decoded form carries the parent
/// resolved through an explicit lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    body: String,
    created_at: u64,
    parent: Photo,
}

impl Comment {
    /// `created_at` is unix millis.
    pub fn new(body: impl Into<String>, parent: Photo, created_at: u64) -> Self {
        Self {
            body: body.into(),
            created_at,
            parent,
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Creation instant in unix millis
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn parent(&self) -> &Photo {
        &self.parent
    }
}
