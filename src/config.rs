//! Configuration for photostore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a photostore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all table data. Internal structure:
    ///   {data_dir}/
    ///     ├── photos.log       (photo table row log)
    ///     └── comments.log     (comment table row log)
    pub data_dir: PathBuf,

    /// Name of the photo table
    pub photo_table: String,

    /// Name of the comment table
    pub comment_table: String,

    /// Column group holding all cells of both tables
    pub column_group: String,

    // -------------------------------------------------------------------------
    // Row Log Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the row log
    pub log_sync: LogSyncStrategy,

    // -------------------------------------------------------------------------
    // Scan Configuration
    // -------------------------------------------------------------------------
    /// Rows fetched from a table per scan batch
    pub scan_batch_size: usize,

    /// Max concurrently open scans per table
    pub max_open_scans: usize,

    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// Pooled connections kept per table for point reads/writes
    pub pool_size: usize,
}

/// Row log sync strategy
#[derive(Debug, Clone, Copy)]
pub enum LogSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced writes (balanced durability/performance)
    EveryNWrites { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./photostore_data"),
            photo_table: "photos".to_string(),
            comment_table: "comments".to_string(),
            column_group: "cf".to_string(),
            log_sync: LogSyncStrategy::EveryWrite,
            scan_batch_size: 64,
            max_open_scans: 64,
            pool_size: 8,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all table logs)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the photo table name
    pub fn photo_table(mut self, name: impl Into<String>) -> Self {
        self.config.photo_table = name.into();
        self
    }

    /// Set the comment table name
    pub fn comment_table(mut self, name: impl Into<String>) -> Self {
        self.config.comment_table = name.into();
        self
    }

    /// Set the column group name
    pub fn column_group(mut self, name: impl Into<String>) -> Self {
        self.config.column_group = name.into();
        self
    }

    /// Set the row log sync strategy
    pub fn log_sync(mut self, strategy: LogSyncStrategy) -> Self {
        self.config.log_sync = strategy;
        self
    }

    /// Set the number of rows fetched per scan batch
    pub fn scan_batch_size(mut self, rows: usize) -> Self {
        self.config.scan_batch_size = rows;
        self
    }

    /// Set the maximum number of concurrently open scans per table
    pub fn max_open_scans(mut self, count: usize) -> Self {
        self.config.max_open_scans = count;
        self
    }

    /// Set the pooled connection count per table
    pub fn pool_size(mut self, count: usize) -> Self {
        self.config.pool_size = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
