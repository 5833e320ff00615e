//! Admin
//!
//! Table provisioning: idempotent ensure-exists for tables and their column
//! groups. Runs to completion at startup, before any storage operation; a
//! failure here is fatal and must abort initialization.

use std::sync::Arc;

use crate::error::ProvisionError;

use super::table::Table;
use super::Store;

/// Administrative handle over a store
pub struct Admin<'a> {
    store: &'a Store,
}

impl<'a> Admin<'a> {
    pub(super) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Whether the named table is provisioned
    pub fn table_exists(&self, name: &str) -> bool {
        self.store.tables.read().contains_key(name)
    }

    /// Ensure the named table exists with the given column groups
    ///
    /// Idempotent: an already-provisioned table is left as is. A fresh
    /// table opens (and replays) its row log under the data directory.
    pub fn ensure_table(
        &self,
        name: &str,
        column_groups: &[&str],
    ) -> Result<(), ProvisionError> {
        if name.is_empty() || name.contains(std::path::is_separator) {
            return Err(ProvisionError::Invalid(format!("bad table name {name:?}")));
        }
        if column_groups.is_empty() {
            return Err(ProvisionError::Invalid(format!(
                "table {name} needs at least one column group"
            )));
        }

        let mut tables = self.store.tables.write();
        if tables.contains_key(name) {
            tracing::debug!(table = name, "table already provisioned");
            return Ok(());
        }

        tracing::info!(table = name, ?column_groups, "creating table");
        let log_path = self.store.config.data_dir.join(format!("{name}.log"));
        let table = Table::open(
            name,
            column_groups,
            &log_path,
            self.store.config.log_sync,
            self.store.config.max_open_scans,
        )?;

        tables.insert(name.to_string(), Arc::new(table));
        Ok(())
    }
}
