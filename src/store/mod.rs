//! Backing store
//!
//! An embedded sorted, column-oriented key-value store: rows addressed by
//! byte keys in lexicographic order, cells grouped into named column groups,
//! atomic per-row put/get, ordered range scans.
//!
//! ## Responsibilities
//! - Keep each table's rows sorted and durable (append-only row log)
//! - Atomic per-row put/get; no cross-row transactions
//! - Batched range scans with per-table scanner accounting
//! - Pooled connections for point ops, dedicated connections for scans
//! - Idempotent table provisioning at startup
//!
//! ## Structure
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Store                                         │
//! │  ├── Admin          (ensure-exists provision) │
//! │  ├── ConnectionPool (point reads/writes)      │
//! │  └── Connection     (dedicated, for scans)    │
//! │        └── ScanHandle                         │
//! │                                               │
//! │ Table = RwLock<BTreeMap<key, Row>> + RowLog   │
//! └───────────────────────────────────────────────┘
//! ```

mod admin;
mod log;
mod pool;
mod scan;
mod table;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ProvisionError, StoreError};

pub use admin::Admin;
pub use pool::{Connection, ConnectionPool, PooledConnection};
pub use scan::ScanHandle;
pub use table::Table;

// =============================================================================
// Row
// =============================================================================

/// One stored row: cells addressed by (column group, qualifier)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    groups: BTreeMap<String, BTreeMap<String, Bytes>>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, replacing any previous value
    pub fn set(&mut self, group: &str, qualifier: &str, value: impl Into<Bytes>) -> &mut Self {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(qualifier.to_string(), value.into());
        self
    }

    /// Read a cell
    pub fn get(&self, group: &str, qualifier: &str) -> Option<&Bytes> {
        self.groups.get(group).and_then(|cells| cells.get(qualifier))
    }

    /// Column groups this row has cells in
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn cell_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }
}

// =============================================================================
// Store
// =============================================================================

/// Handle to the store: provisioned tables plus connection management
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct Store {
    config: Config,
    tables: RwLock<HashMap<String, Arc<Table>>>,
}

impl Store {
    /// Open the store rooted at the configured data directory
    pub fn open(config: Config) -> std::result::Result<Self, ProvisionError> {
        fs::create_dir_all(&config.data_dir)?;
        tracing::info!(data_dir = %config.data_dir.display(), "opening store");

        Ok(Self {
            config,
            tables: RwLock::new(HashMap::new()),
        })
    }

    /// Administrative handle for table provisioning
    pub fn admin(&self) -> Admin<'_> {
        Admin::new(self)
    }

    /// Connection pool over a provisioned table, for point reads/writes
    pub fn pool(&self, table_name: &str) -> Result<ConnectionPool, StoreError> {
        Ok(ConnectionPool::new(
            self.table(table_name)?,
            self.config.pool_size,
        ))
    }

    /// Dedicated connection to a provisioned table
    ///
    /// Scans go through dedicated connections, never through the pool, so a
    /// long-lived enumeration and concurrent point traffic cannot starve
    /// each other.
    pub fn connect(&self, table_name: &str) -> Result<Connection, StoreError> {
        Ok(Connection::new(self.table(table_name)?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn table(&self, name: &str) -> Result<Arc<Table>, StoreError> {
        self.tables.read().get(name).cloned().ok_or_else(|| {
            StoreError::Unavailable(format!("table {name} is not provisioned"))
        })
    }
}
