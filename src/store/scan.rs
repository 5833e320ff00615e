//! Scan Handle
//!
//! One open range scan over a table: batched row fetches in key order,
//! resuming strictly after the last delivered key. Holds a scanner permit
//! for its whole life; closing (or dropping) the handle frees the slot.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::key::ScanRange;

use super::table::{ScanPermit, Table};
use super::Row;

/// An open, forward-only scan over a key range
///
/// Non-restartable: once closed it only ever reports exhaustion.
pub struct ScanHandle {
    table: Arc<Table>,
    permit: Option<ScanPermit>,
    range: ScanRange,
    batch_size: usize,

    buffer: VecDeque<(Vec<u8>, Row)>,
    last_key: Option<Vec<u8>>,
    /// The table returned a short batch; nothing further exists
    drained: bool,
}

impl ScanHandle {
    /// Open a scan, claiming one of the table's scanner slots
    pub(super) fn open(table: Arc<Table>, range: ScanRange, batch_size: usize) -> Result<Self> {
        if let Some(end) = &range.end {
            if range.start > *end {
                return Err(StoreError::InvalidKey(
                    "scan range start is after its end".to_string(),
                ));
            }
        }

        let permit = table.acquire_scan_permit()?;
        tracing::debug!(table = table.name(), "scan opened");

        Ok(Self {
            table,
            permit: Some(permit),
            range,
            batch_size: batch_size.max(1),
            buffer: VecDeque::new(),
            last_key: None,
            drained: false,
        })
    }

    /// Fetch the next row, or `None` once the range is exhausted
    ///
    /// Exhaustion closes the handle and releases its scanner slot.
    pub fn next_row(&mut self) -> Result<Option<(Vec<u8>, Row)>> {
        if self.permit.is_none() {
            return Ok(None);
        }

        if self.buffer.is_empty() && !self.drained {
            let batch = self
                .table
                .next_batch(&self.range, self.last_key.as_deref(), self.batch_size);
            if batch.len() < self.batch_size {
                self.drained = true;
            }
            self.buffer.extend(batch);
        }

        match self.buffer.pop_front() {
            Some((key, row)) => {
                self.last_key = Some(key.clone());
                Ok(Some((key, row)))
            }
            None => {
                self.close();
                Ok(None)
            }
        }
    }

    /// Release the scanner slot; further `next_row` calls report exhaustion
    pub fn close(&mut self) {
        if self.permit.take().is_some() {
            self.buffer.clear();
            tracing::debug!(table = self.table.name(), "scan closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.permit.is_none()
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.close();
    }
}
