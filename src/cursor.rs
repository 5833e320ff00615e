//! Scanning cursor
//!
//! A bounded, lazily-decoded sequence of domain records over a store range
//! scan. Each cursor owns a dedicated connection's scan handle (never one
//! borrowed from the pool), so iteration lifetime is decoupled from
//! concurrent point traffic.
//!
//! The sequence is finite and non-restartable. Resources release
//! deterministically on every exit path: normal exhaustion, an early
//! consumer stop (explicit [`ScanCursor::stop`] or drop), and any decode or
//! I/O error mid-scan, after which the cursor is fused.

use crate::error::Result;
use crate::key::ScanRange;
use crate::model::{Comment, Photo};
use crate::store::{Connection, Row, ScanHandle};

/// Decodes one fetched row into a domain record
pub(crate) type DecodeFn<T> = Box<dyn FnMut(&[u8], &Row) -> Result<T> + Send>;

/// Lazy cursor over `list_photos`
pub type PhotoCursor = ScanCursor<Photo>;

/// Lazy cursor over `get_comments`
pub type CommentCursor = ScanCursor<Comment>;

/// A bounded lazy sequence of decoded records
///
/// Construction performs only the cost of opening the scan and fetching the
/// first element; every further row is fetched and decoded on demand.
pub struct ScanCursor<T> {
    scan: Option<ScanHandle>,
    decode: DecodeFn<T>,
    remaining: usize,
    prefetched: Option<Result<T>>,
}

impl<T> ScanCursor<T> {
    /// Open a cursor on a dedicated connection
    pub(crate) fn open(
        connection: &Connection,
        range: ScanRange,
        limit: usize,
        batch_size: usize,
        decode: DecodeFn<T>,
    ) -> Result<Self> {
        let scan = connection.open_scan(range, batch_size)?;

        let mut cursor = Self {
            scan: Some(scan),
            decode,
            remaining: limit,
            prefetched: None,
        };
        cursor.prefetched = cursor.fetch();
        Ok(cursor)
    }

    /// Stop consuming and release the scan immediately
    ///
    /// Discards any prefetched element: a stopped cursor yields nothing
    /// further. Idempotent; also runs on drop.
    pub fn stop(&mut self) {
        self.prefetched = None;
        if let Some(mut scan) = self.scan.take() {
            scan.close();
        }
    }

    /// Fetch and decode the next element, closing the scan at the limit, at
    /// exhaustion, and on the first error
    fn fetch(&mut self) -> Option<Result<T>> {
        if self.remaining == 0 {
            self.stop();
            return None;
        }
        let scan = self.scan.as_mut()?;

        match scan.next_row() {
            Ok(Some((key, row))) => match (self.decode)(&key, &row) {
                Ok(item) => {
                    self.remaining -= 1;
                    Some(Ok(item))
                }
                Err(e) => {
                    self.stop();
                    Some(Err(e))
                }
            },
            Ok(None) => {
                self.stop();
                None
            }
            Err(e) => {
                self.stop();
                Some(Err(e))
            }
        }
    }
}

impl<T> Iterator for ScanCursor<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        let current = self.prefetched.take()?;
        // After an error the scan is already closed and fetch returns None,
        // leaving the cursor fused.
        self.prefetched = self.fetch();
        Some(current)
    }
}

impl<T> Drop for ScanCursor<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T> std::fmt::Debug for ScanCursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCursor")
            .field("remaining", &self.remaining)
            .field("open", &self.scan.is_some())
            .finish()
    }
}

/// Drain a cursor into a vec, stopping at the first error
///
/// Convenience for callers that want everything the bounded scan yields.
pub fn collect_all<T>(cursor: ScanCursor<T>) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for item in cursor {
        items.push(item?);
    }
    Ok(items)
}
