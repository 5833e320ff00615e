//! Engine Module
//!
//! The storage engine facade: the one component collaborators talk to.
//!
//! ## Responsibilities
//! - Provision both tables at startup, before any operation (fail fast)
//! - Compute row keys and shape records on every write
//! - Point lookups and bounded newest-first enumeration
//! - Resolve comment parent references through explicit lookups
//!
//! The engine is constructed explicitly and passed by reference into
//! collaborators; there is no lazily-built global instance. It holds no
//! mutable shared state beyond its connection pools; concurrent writes rely
//! entirely on the backing store's per-row atomicity.

use bytes::Bytes;

use crate::config::Config;
use crate::cursor::{CommentCursor, PhotoCursor, ScanCursor};
use crate::error::{ProvisionError, Result, StoreError};
use crate::key::{comment_range, encode_comment_key, encode_photo_key, ScanRange, PHOTO_KEY_WIDTH};
use crate::model::{Comment, ContentHash, Photo};
use crate::row::{comment_to_row, photo_to_row, row_to_comment, row_to_photo};
use crate::store::{ConnectionPool, Row, Store};

// =============================================================================
// Write outcome
// =============================================================================

/// Outcome of storing a photo
///
/// `AlreadyExists` is a normal outcome, not an error: a row already occupied
/// the exact key (same content hash *and* same timestamp). Because the key
/// mixes in the timestamp, this is only partial content dedup: the same
/// contents uploaded at a different instant create a fresh row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
    /// The row was newly created
    Created,
    /// A row already occupied this exact key; it was left untouched
    AlreadyExists,
}

impl Inserted {
    pub fn is_created(&self) -> bool {
        matches!(self, Inserted::Created)
    }
}

// =============================================================================
// Engine
// =============================================================================

/// The storage engine
pub struct Engine {
    config: Config,
    store: Store,

    /// Pooled point-access connections, one pool per table
    photo_pool: ConnectionPool,
    comment_pool: ConnectionPool,
}

impl Engine {
    /// Open an engine: provision both tables, then serve
    ///
    /// Provisioning runs to completion before any operation is accepted;
    /// a failure here aborts startup.
    pub fn open(config: Config) -> std::result::Result<Self, ProvisionError> {
        let store = Store::open(config.clone())?;

        let admin = store.admin();
        admin.ensure_table(&config.photo_table, &[&config.column_group])?;
        admin.ensure_table(&config.comment_table, &[&config.column_group])?;

        let photo_pool = store
            .pool(&config.photo_table)
            .map_err(|e| ProvisionError::Invalid(format!("photo table pool: {e}")))?;
        let comment_pool = store
            .pool(&config.comment_table)
            .map_err(|e| ProvisionError::Invalid(format!("comment table pool: {e}")))?;

        tracing::info!(
            photo_table = %config.photo_table,
            comment_table = %config.comment_table,
            "engine ready"
        );

        Ok(Self {
            config,
            store,
            photo_pool,
            comment_pool,
        })
    }

    // =========================================================================
    // Photos
    // =========================================================================

    /// Store a photo at its computed key
    ///
    /// The backing write is put-if-absent: an existing row at the exact key
    /// is reported as [`Inserted::AlreadyExists`], never silently
    /// overwritten.
    pub fn put_photo(&self, photo: &Photo) -> Result<Inserted> {
        let key = encode_photo_key(photo.hash().as_bytes(), photo.created_at())?;
        let row = photo_to_row(photo, &self.config.column_group);

        let created = self.photo_pool.get().put_if_absent(&key, row)?;
        tracing::debug!(hash = %photo.hash(), at = photo.created_at(), created, "photo stored");

        Ok(if created {
            Inserted::Created
        } else {
            Inserted::AlreadyExists
        })
    }

    /// Store a photo from collaborator-supplied parts; hashing happens here
    ///
    /// `at` is unix millis.
    pub fn store_photo(
        &self,
        title: &str,
        contents: impl Into<Bytes>,
        at: u64,
    ) -> Result<Inserted> {
        self.put_photo(&Photo::new(title, contents, at))
    }

    /// Point lookup by encoded row key; `None` if absent
    pub fn get_photo(&self, key: &[u8]) -> Result<Option<Photo>> {
        if key.len() != PHOTO_KEY_WIDTH {
            return Err(StoreError::InvalidKey(format!(
                "photo key must be {PHOTO_KEY_WIDTH} bytes, got {}",
                key.len()
            )));
        }

        match self.photo_pool.get().get(key)? {
            Some(row) => Ok(Some(row_to_photo(&row, &self.config.column_group)?)),
            None => Ok(None),
        }
    }

    /// Point lookup by the human-visible identity pair (hex hash, timestamp)
    ///
    /// The storage key is derived internally.
    pub fn get_photo_by_identity(&self, hash: &str, at: u64) -> Result<Option<Photo>> {
        let hash = ContentHash::from_hex(hash)?;
        let key = encode_photo_key(hash.as_bytes(), at)?;
        self.get_photo(&key)
    }

    /// Bounded newest-first enumeration of all photos
    ///
    /// Newest-first falls out of key construction; the scan itself is a
    /// plain forward range walk on a dedicated connection.
    pub fn list_photos(&self, limit: usize) -> Result<PhotoCursor> {
        let connection = self.store.connect(&self.config.photo_table)?;
        let group = self.config.column_group.clone();

        ScanCursor::open(
            &connection,
            ScanRange::all(),
            limit,
            self.config.scan_batch_size,
            Box::new(move |_key: &[u8], row: &Row| row_to_photo(row, &group)),
        )
    }

    /// Collaborator alias for [`Engine::list_photos`]
    pub fn list_recent_photos(&self, limit: usize) -> Result<PhotoCursor> {
        self.list_photos(limit)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Store a comment under its parent photo's key prefix
    ///
    /// The caller supplies an already-resolved parent; existence is not
    /// re-verified here, but the parent's key is persisted for later
    /// resolution. Identical (photo, millisecond) comment keys collide;
    /// the backing put overwrites, which callers at millisecond resolution
    /// never observe in practice.
    pub fn put_comment(&self, comment: &Comment) -> Result<()> {
        let parent = comment.parent();
        let key = encode_comment_key(parent.hash().as_bytes(), comment.created_at())?;
        let row = comment_to_row(comment, &self.config.column_group)?;

        self.comment_pool.get().put(&key, row)?;
        tracing::debug!(
            parent = %parent.hash(),
            at = comment.created_at(),
            "comment stored"
        );
        Ok(())
    }

    /// Add a comment to the photo identified by (hex hash, timestamp)
    ///
    /// Resolves the parent internally; fails with `NotFound` if it is
    /// absent. `commented_at` is the comment's own creation instant, unix
    /// millis, supplied by the collaborator like every other timestamp.
    pub fn add_comment(
        &self,
        hash: &str,
        at: u64,
        body: &str,
        commented_at: u64,
    ) -> Result<()> {
        let parent = self
            .get_photo_by_identity(hash, at)?
            .ok_or(StoreError::NotFound)?;
        self.put_comment(&Comment::new(body, parent, commented_at))
    }

    /// Bounded newest-first enumeration of one photo's comments
    ///
    /// Each row's stored parent key is resolved as it is decoded. The
    /// common case (the key of the photo being listed) resolves without
    /// touching the store; anything else goes through a pooled point
    /// lookup, failing with `NotFound` if the referenced photo is gone.
    pub fn get_comments(&self, photo: &Photo, limit: usize) -> Result<CommentCursor> {
        let range = comment_range(photo.hash().as_bytes())?;
        let connection = self.store.connect(&self.config.comment_table)?;

        let group = self.config.column_group.clone();
        let parent = photo.clone();
        let parent_key = photo.key();
        let photo_pool = self.photo_pool.clone();

        let decode = move |_key: &[u8], row: &Row| {
            row_to_comment(row, &group, |stored_key: &[u8]| {
                if stored_key == parent_key.as_slice() {
                    return Ok(parent.clone());
                }
                match photo_pool.get().get(stored_key)? {
                    Some(photo_row) => row_to_photo(&photo_row, &group),
                    None => Err(StoreError::NotFound),
                }
            })
        };

        ScanCursor::open(
            &connection,
            range,
            limit,
            self.config.scan_batch_size,
            Box::new(decode),
        )
    }

    /// Collaborator form of [`Engine::get_comments`], from the identity pair
    pub fn list_comments(&self, hash: &str, at: u64, limit: usize) -> Result<CommentCursor> {
        let photo = self
            .get_photo_by_identity(hash, at)?
            .ok_or(StoreError::NotFound)?;
        self.get_comments(&photo, limit)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}
