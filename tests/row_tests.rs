//! Tests for the record codec
//!
//! These tests verify:
//! - Photo and comment round trips through stored cells
//! - Resolver-based parent resolution without codec I/O
//! - Typed CorruptRecord failures for malformed cells

use bytes::Bytes;
use photostore::key::encode_photo_key;
use photostore::row::{
    comment_to_row, photo_to_row, row_to_comment, row_to_photo, COL_BODY, COL_DATE, COL_PARENT,
    COL_TITLE, COL_VALUE,
};
use photostore::store::Row;
use photostore::{Comment, Photo, StoreError};

const GROUP: &str = "cf";

// =============================================================================
// Helper Functions
// =============================================================================

fn sample_photo() -> Photo {
    Photo::new("sunset", Bytes::from_static(b"jpeg bytes"), 1_700_000_000_000)
}

// =============================================================================
// Photo Round Trip
// =============================================================================

#[test]
fn test_photo_round_trip() {
    let photo = sample_photo();
    let row = photo_to_row(&photo, GROUP);
    let decoded = row_to_photo(&row, GROUP).unwrap();

    assert_eq!(decoded, photo);
    // Identity re-derives from contents, not from the key
    assert_eq!(decoded.hash(), photo.hash());
}

#[test]
fn test_photo_row_stores_true_timestamp() {
    let photo = sample_photo();
    let row = photo_to_row(&photo, GROUP);

    // The date cell holds the non-inverted timestamp
    let date = row.get(GROUP, COL_DATE).unwrap();
    assert_eq!(date.as_ref(), photo.created_at().to_be_bytes());
}

#[test]
fn test_photo_missing_columns() {
    let photo = sample_photo();

    for dropped in [COL_VALUE, COL_TITLE, COL_DATE] {
        let full = photo_to_row(&photo, GROUP);
        let mut row = Row::new();
        for col in [COL_VALUE, COL_TITLE, COL_DATE] {
            if col != dropped {
                row.set(GROUP, col, full.get(GROUP, col).unwrap().clone());
            }
        }

        let err = row_to_photo(&row, GROUP).unwrap_err();
        assert!(
            matches!(err, StoreError::CorruptRecord(_)),
            "dropping {dropped} must be CorruptRecord"
        );
    }
}

#[test]
fn test_photo_bad_date_width() {
    let mut row = photo_to_row(&sample_photo(), GROUP);
    row.set(GROUP, COL_DATE, Bytes::from_static(&[1, 2, 3]));

    assert!(matches!(
        row_to_photo(&row, GROUP),
        Err(StoreError::CorruptRecord(_))
    ));
}

#[test]
fn test_photo_title_not_utf8() {
    let mut row = photo_to_row(&sample_photo(), GROUP);
    row.set(GROUP, COL_TITLE, Bytes::from_static(&[0xFF, 0xFE]));

    assert!(matches!(
        row_to_photo(&row, GROUP),
        Err(StoreError::CorruptRecord(_))
    ));
}

#[test]
fn test_photo_wrong_group_is_corrupt() {
    let row = photo_to_row(&sample_photo(), "other");
    assert!(matches!(
        row_to_photo(&row, GROUP),
        Err(StoreError::CorruptRecord(_))
    ));
}

// =============================================================================
// Comment Round Trip
// =============================================================================

#[test]
fn test_comment_round_trip() {
    let parent = sample_photo();
    let comment = Comment::new("lovely light", parent.clone(), 1_700_000_111_000);

    let row = comment_to_row(&comment, GROUP).unwrap();
    let decoded = row_to_comment(&row, GROUP, |key| {
        // The stored reference must be the parent's encoded key
        let expected = encode_photo_key(parent.hash().as_bytes(), parent.created_at()).unwrap();
        assert_eq!(key, expected);
        Ok(parent.clone())
    })
    .unwrap();

    assert_eq!(decoded, comment);
    assert_eq!(decoded.parent(), &parent);
}

#[test]
fn test_comment_missing_parent_column() {
    let parent = sample_photo();
    let comment = Comment::new("nice", parent.clone(), 5);
    let full = comment_to_row(&comment, GROUP).unwrap();

    let mut row = Row::new();
    row.set(GROUP, COL_BODY, full.get(GROUP, COL_BODY).unwrap().clone());
    row.set(GROUP, COL_DATE, full.get(GROUP, COL_DATE).unwrap().clone());

    let err = row_to_comment(&row, GROUP, |_| Ok(parent.clone())).unwrap_err();
    assert!(matches!(err, StoreError::CorruptRecord(_)));
}

#[test]
fn test_comment_truncated_parent_key() {
    let parent = sample_photo();
    let comment = Comment::new("nice", parent.clone(), 5);

    let mut row = comment_to_row(&comment, GROUP).unwrap();
    row.set(GROUP, COL_PARENT, Bytes::from_static(&[1, 2, 3]));

    let err = row_to_comment(&row, GROUP, |_| Ok(parent.clone())).unwrap_err();
    assert!(matches!(err, StoreError::CorruptRecord(_)));
}

#[test]
fn test_comment_resolver_error_propagates() {
    let parent = sample_photo();
    let comment = Comment::new("orphaned", parent, 5);
    let row = comment_to_row(&comment, GROUP).unwrap();

    let err = row_to_comment(&row, GROUP, |_| Err(StoreError::NotFound)).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}
