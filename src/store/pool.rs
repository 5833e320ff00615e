//! Connections and the connection pool
//!
//! Point reads and writes borrow a connection from a bounded pool and
//! return it on drop. Scans use dedicated connections opened outside the
//! pool, so a long-lived enumeration and concurrent point traffic cannot
//! starve each other.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::key::ScanRange;

use super::scan::ScanHandle;
use super::table::Table;
use super::Row;

// =============================================================================
// Connection
// =============================================================================

/// A connection to one table
pub struct Connection {
    table: Arc<Table>,
}

impl Connection {
    pub(super) fn new(table: Arc<Table>) -> Self {
        Self { table }
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    /// Atomic per-row write; replaces any previous row at the key
    pub fn put(&self, key: &[u8], row: Row) -> Result<()> {
        self.table.put(key, row)
    }

    /// Atomic write only if the key is absent; `true` means created
    pub fn put_if_absent(&self, key: &[u8], row: Row) -> Result<bool> {
        self.table.put_if_absent(key, row)
    }

    /// Point lookup
    pub fn get(&self, key: &[u8]) -> Result<Option<Row>> {
        self.table.get(key)
    }

    /// Open a range scan on this connection
    pub fn open_scan(&self, range: ScanRange, batch_size: usize) -> Result<ScanHandle> {
        ScanHandle::open(Arc::clone(&self.table), range, batch_size)
    }

    /// Currently open scans on the underlying table
    pub fn open_scan_count(&self) -> usize {
        self.table.open_scan_count()
    }
}

// =============================================================================
// Connection Pool
// =============================================================================

/// Bounded pool of connections to one table
///
/// `get` hands out an idle connection or opens a fresh one; dropping the
/// returned guard puts the connection back while the pool has room.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    table: Arc<Table>,
    idle: Mutex<Vec<Connection>>,
    capacity: usize,
}

impl ConnectionPool {
    pub(super) fn new(table: Arc<Table>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                table,
                idle: Mutex::new(Vec::with_capacity(capacity)),
                capacity,
            }),
        }
    }

    /// Borrow a connection; returned to the pool when the guard drops
    pub fn get(&self) -> PooledConnection {
        let conn = self
            .inner
            .idle
            .lock()
            .pop()
            .unwrap_or_else(|| Connection::new(Arc::clone(&self.inner.table)));

        PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
        }
    }

    /// Idle connections currently parked in the pool
    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().len()
    }
}

/// Guard over a borrowed connection
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<PoolInner>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Present from construction until drop
        self.conn.as_ref().expect("connection taken")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let mut idle = self.pool.idle.lock();
            if idle.len() < self.pool.capacity {
                idle.push(conn);
            }
        }
    }
}
