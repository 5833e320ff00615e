//! Record codec
//!
//! Maps photos and comments to named column cells and back. The row *key*
//! carries the inverted timestamp for ordering; the `date` cell stores the
//! true timestamp, so reads never do inversion arithmetic.
//!
//! The codec does no storage I/O: decoding a comment takes a caller-supplied
//! resolver that turns the stored parent key into a photo. Any missing or
//! malformed cell is a typed `CorruptRecord` failure, never a panic.

use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::key::{encode_photo_key, PHOTO_KEY_WIDTH, TIMESTAMP_WIDTH};
use crate::model::{Comment, Photo};
use crate::store::Row;

// =============================================================================
// Column qualifiers
// =============================================================================

/// Photo contents
pub const COL_VALUE: &str = "value";
/// Photo title (UTF-8)
pub const COL_TITLE: &str = "title";
/// True (non-inverted) timestamp, 8-byte big-endian unix millis
pub const COL_DATE: &str = "date";
/// Comment body (UTF-8)
pub const COL_BODY: &str = "body";
/// Encoded row key of the comment's parent photo
pub const COL_PARENT: &str = "parent";

// =============================================================================
// Photo codec
// =============================================================================

/// Shape a photo into its stored cells
pub fn photo_to_row(photo: &Photo, group: &str) -> Row {
    let mut row = Row::new();
    row.set(group, COL_VALUE, photo.contents().clone());
    row.set(group, COL_TITLE, Bytes::copy_from_slice(photo.title().as_bytes()));
    row.set(
        group,
        COL_DATE,
        Bytes::copy_from_slice(&photo.created_at().to_be_bytes()),
    );
    row
}

/// Rebuild a photo from its stored cells
///
/// The content hash is re-derived from the stored contents rather than
/// decoded from the key.
pub fn row_to_photo(row: &Row, group: &str) -> Result<Photo> {
    let contents = required(row, group, COL_VALUE)?.clone();
    let title = utf8(required(row, group, COL_TITLE)?, COL_TITLE)?;
    let created_at = date(required(row, group, COL_DATE)?)?;

    Ok(Photo::new(title, contents, created_at))
}

// =============================================================================
// Comment codec
// =============================================================================

/// Shape a comment into its stored cells
///
/// The parent photo is persisted as its encoded row key, a reference to be
/// resolved by lookup rather than an owned copy.
pub fn comment_to_row(comment: &Comment, group: &str) -> Result<Row> {
    let parent = comment.parent();
    let parent_key = encode_photo_key(parent.hash().as_bytes(), parent.created_at())?;

    let mut row = Row::new();
    row.set(group, COL_BODY, Bytes::copy_from_slice(comment.body().as_bytes()));
    row.set(group, COL_PARENT, Bytes::copy_from_slice(&parent_key));
    row.set(
        group,
        COL_DATE,
        Bytes::copy_from_slice(&comment.created_at().to_be_bytes()),
    );
    Ok(row)
}

/// Rebuild a comment, resolving its parent through `resolve_parent`
pub fn row_to_comment<F>(row: &Row, group: &str, mut resolve_parent: F) -> Result<Comment>
where
    F: FnMut(&[u8]) -> Result<Photo>,
{
    let body = utf8(required(row, group, COL_BODY)?, COL_BODY)?;
    let created_at = date(required(row, group, COL_DATE)?)?;

    let parent_key = required(row, group, COL_PARENT)?;
    if parent_key.len() != PHOTO_KEY_WIDTH {
        return Err(StoreError::CorruptRecord(format!(
            "parent key must be {PHOTO_KEY_WIDTH} bytes, got {}",
            parent_key.len()
        )));
    }
    let parent = resolve_parent(parent_key)?;

    Ok(Comment::new(body, parent, created_at))
}

// =============================================================================
// Cell helpers
// =============================================================================

fn required<'a>(row: &'a Row, group: &str, qualifier: &str) -> Result<&'a Bytes> {
    row.get(group, qualifier).ok_or_else(|| {
        StoreError::CorruptRecord(format!("missing column {group}:{qualifier}"))
    })
}

fn utf8(cell: &Bytes, qualifier: &str) -> Result<String> {
    std::str::from_utf8(cell)
        .map(str::to_string)
        .map_err(|_| StoreError::CorruptRecord(format!("column {qualifier} is not UTF-8")))
}

fn date(cell: &Bytes) -> Result<u64> {
    let raw: [u8; TIMESTAMP_WIDTH] = cell.as_ref().try_into().map_err(|_| {
        StoreError::CorruptRecord(format!(
            "date column must be {TIMESTAMP_WIDTH} bytes, got {}",
            cell.len()
        ))
    })?;
    Ok(u64::from_be_bytes(raw))
}
