//! Table
//!
//! One sorted table: an ordered tree of rows behind a RwLock, backed by an
//! append-only row log for durability.
//!
//! ## Concurrency
//! - `rows`: RwLock — many concurrent readers, exclusive writer
//! - `log`: Mutex — appends are serialized with the row insert that follows,
//!   under the tree's write lock, so log order matches insert order
//! - `open_scans`: atomic counter enforcing the per-table scanner cap
//!
//! Per-row atomicity is the whole contract: there are no cross-row
//! transactions, and rows are never updated or deleted once written.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::LogSyncStrategy;
use crate::error::{ProvisionError, Result, StoreError};
use crate::key::ScanRange;

use super::log::RowLog;
use super::Row;

/// A provisioned table
pub struct Table {
    name: String,
    column_groups: Vec<String>,

    /// Sorted row tree; scans walk it in key order
    rows: RwLock<BTreeMap<Vec<u8>, Row>>,

    /// Durability log; replayed into `rows` on open
    log: Mutex<RowLog>,

    /// Currently open scans (capped at `max_open_scans`)
    open_scans: AtomicUsize,
    max_open_scans: usize,
}

impl Table {
    /// Open a table, replaying its row log into memory
    pub(super) fn open(
        name: &str,
        column_groups: &[&str],
        log_path: &Path,
        sync: LogSyncStrategy,
        max_open_scans: usize,
    ) -> std::result::Result<Self, ProvisionError> {
        let (log, records) = RowLog::open(log_path, sync)?;

        let mut rows = BTreeMap::new();
        for (key, row) in records {
            rows.insert(key, row);
        }

        tracing::debug!(table = name, rows = rows.len(), "table opened");

        Ok(Self {
            name: name.to_string(),
            column_groups: column_groups.iter().map(|g| g.to_string()).collect(),
            rows: RwLock::new(rows),
            log: Mutex::new(log),
            open_scans: AtomicUsize::new(0),
            max_open_scans,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_groups(&self) -> &[String] {
        &self.column_groups
    }

    /// Write a row only if its key is absent
    ///
    /// Returns `true` if the row was created, `false` if a row already
    /// occupied the key. The existing row is left untouched: reporting,
    /// not overwriting, is the contract for entity rows.
    pub fn put_if_absent(&self, key: &[u8], row: Row) -> Result<bool> {
        self.check_groups(&row)?;

        let mut rows = self.rows.write();
        if rows.contains_key(key) {
            return Ok(false);
        }
        self.log.lock().append(key, &row)?;
        rows.insert(key.to_vec(), row);
        Ok(true)
    }

    /// Write a row, replacing any previous row at the key
    pub fn put(&self, key: &[u8], row: Row) -> Result<()> {
        self.check_groups(&row)?;

        let mut rows = self.rows.write();
        self.log.lock().append(key, &row)?;
        rows.insert(key.to_vec(), row);
        Ok(())
    }

    /// Point lookup
    pub fn get(&self, key: &[u8]) -> Result<Option<Row>> {
        Ok(self.rows.read().get(key).cloned())
    }

    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    /// Fetch the next batch of rows in `range`, strictly after `after`
    ///
    /// Reads from the live tree: rows inserted behind the scan position are
    /// never revisited; rows ahead of it may or may not be observed.
    pub(super) fn next_batch(
        &self,
        range: &ScanRange,
        after: Option<&[u8]>,
        limit: usize,
    ) -> Vec<(Vec<u8>, Row)> {
        let lower = match after {
            Some(key) => Bound::Excluded(key.to_vec()),
            None => Bound::Included(range.start.clone()),
        };
        let upper = match &range.end {
            Some(end) => Bound::Excluded(end.clone()),
            None => Bound::Unbounded,
        };

        self.rows
            .read()
            .range((lower, upper))
            .take(limit)
            .map(|(key, row)| (key.clone(), row.clone()))
            .collect()
    }

    // =========================================================================
    // Scanner accounting
    // =========================================================================

    /// Claim one of the table's scanner slots
    pub(super) fn acquire_scan_permit(self: &Arc<Self>) -> Result<ScanPermit> {
        let claimed = self.open_scans.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |open| (open < self.max_open_scans).then_some(open + 1),
        );

        match claimed {
            Ok(_) => Ok(ScanPermit {
                table: Arc::clone(self),
            }),
            Err(open) => Err(StoreError::Unavailable(format!(
                "scanner limit reached on table {} ({open} open)",
                self.name
            ))),
        }
    }

    /// Currently open scans
    pub fn open_scan_count(&self) -> usize {
        self.open_scans.load(Ordering::SeqCst)
    }

    /// Every cell must address a declared column group
    fn check_groups(&self, row: &Row) -> Result<()> {
        for group in row.group_names() {
            if !self.column_groups.iter().any(|g| g == group) {
                return Err(StoreError::InvalidKey(format!(
                    "unknown column group {group} on table {}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Holds one scanner slot; the slot frees when the permit drops
pub(super) struct ScanPermit {
    table: Arc<Table>,
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.table.open_scans.fetch_sub(1, Ordering::SeqCst);
    }
}
