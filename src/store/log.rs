//! Row Log
//!
//! Append-only durability log, one file per table. Every row written to a
//! table is framed and appended here first; reopening a table replays the
//! log to rebuild the row tree. Rows are immutable, so the log never needs
//! compaction or truncation beyond trimming a torn tail.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Frame 1                                 │
//! │ ┌─────────┬─────────┬────────────────┐  │
//! │ │ Len (4) │ CRC (4) │ bincode record │  │
//! │ └─────────┴─────────┴────────────────┘  │
//! ├─────────────────────────────────────────┤
//! │ Frame 2 ...                             │
//! └─────────────────────────────────────────┘
//! ```
//! Len and CRC are little-endian; the CRC32 covers the record payload.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::LogSyncStrategy;
use crate::error::{ProvisionError, Result, StoreError};

use super::Row;

/// Frame header: payload length (4) + CRC32 (4)
const FRAME_HEADER: usize = 8;

/// One logged row
#[derive(Deserialize)]
struct LogRecord {
    key: Vec<u8>,
    row: Row,
}

/// Borrowed form for serialization (bincode encodes it identically)
#[derive(Serialize)]
struct LogRecordRef<'a> {
    key: &'a [u8],
    row: &'a Row,
}

/// Appends row frames to a table's log file
pub(super) struct RowLog {
    file: File,
    sync: LogSyncStrategy,
    unsynced: usize,
}

impl RowLog {
    /// Open a log, replaying its valid frames
    ///
    /// A torn tail (partial final frame, or a final frame failing its CRC)
    /// is trimmed so later appends land on a clean boundary. A frame that
    /// passes its CRC but does not decode is real corruption and fatal.
    pub(super) fn open(
        path: &Path,
        sync: LogSyncStrategy,
    ) -> std::result::Result<(Self, Vec<(Vec<u8>, Row)>), ProvisionError> {
        let mut records = Vec::new();
        let mut valid_len = 0u64;

        if path.exists() {
            let data = fs::read(path)?;
            let mut pos = 0usize;

            while pos < data.len() {
                if pos + FRAME_HEADER > data.len() {
                    break; // torn header
                }
                let len = u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap()) as usize;
                let crc = u32::from_le_bytes(data[pos + 4..pos + 8].try_into().unwrap());

                let start = pos + FRAME_HEADER;
                if start + len > data.len() {
                    break; // torn payload
                }
                let payload = &data[start..start + len];
                if crc32fast::hash(payload) != crc {
                    break; // torn or bit-rotted tail frame
                }

                let record: LogRecord = bincode::deserialize(payload).map_err(|e| {
                    ProvisionError::Corrupt(format!(
                        "undecodable record at offset {pos} in {}: {e}",
                        path.display()
                    ))
                })?;
                records.push((record.key, record.row));

                pos = start + len;
                valid_len = pos as u64;
            }

            if valid_len < data.len() as u64 {
                tracing::warn!(
                    log = %path.display(),
                    valid = valid_len,
                    total = data.len(),
                    "trimming torn row log tail"
                );
                let trim = OpenOptions::new().write(true).open(path)?;
                trim.set_len(valid_len)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok((
            Self {
                file,
                sync,
                unsynced: 0,
            },
            records,
        ))
    }

    /// Append one row frame, syncing per the configured strategy
    pub(super) fn append(&mut self, key: &[u8], row: &Row) -> Result<()> {
        let payload = bincode::serialize(&LogRecordRef { key, row })
            .map_err(|e| StoreError::Unavailable(format!("row log serialize failed: {e}")))?;

        let mut frame = Vec::with_capacity(FRAME_HEADER + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        frame.extend_from_slice(&payload);

        self.file.write_all(&frame)?;
        self.unsynced += 1;

        match self.sync {
            LogSyncStrategy::EveryWrite => {
                self.file.sync_data()?;
                self.unsynced = 0;
            }
            LogSyncStrategy::EveryNWrites { count } => {
                if self.unsynced >= count {
                    self.file.sync_data()?;
                    self.unsynced = 0;
                }
            }
        }

        Ok(())
    }
}
