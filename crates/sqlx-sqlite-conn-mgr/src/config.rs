//! Configuration for the read-write and read-only SQLite handles

use std::time::Duration;

/// Configuration for a [`SqliteDatabase`](crate::SqliteDatabase)
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_conn_mgr::SqliteDatabaseConfig;
/// use std::time::Duration;
///
/// // Use defaults
/// let config = SqliteDatabaseConfig::default();
///
/// // Override just one field
/// let config = SqliteDatabaseConfig {
///     busy_timeout: Duration::from_millis(250),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct SqliteDatabaseConfig {
   /// Maximum number of concurrent read-only connections
   ///
   /// Every connection in this pool is opened with `SQLITE_OPEN_READONLY`,
   /// so raising it only buys read concurrency, never write access.
   ///
   /// Default: 1
   pub max_read_connections: u32,

   /// Idle timeout for read-only connections
   ///
   /// The read-write connection is pinned for the lifetime of the database
   /// and is not affected by this value.
   ///
   /// Default: 30 seconds
   pub idle_timeout: Duration,

   /// How long a statement waits on a locked database before failing with
   /// `SQLITE_BUSY`. Applied to both handles.
   ///
   /// Default: 5 seconds
   pub busy_timeout: Duration,

   /// Create the database file, and any missing parent directories, if it
   /// does not exist yet
   ///
   /// Default: true
   pub create_if_missing: bool,
}

impl Default for SqliteDatabaseConfig {
   fn default() -> Self {
      Self {
         max_read_connections: 1,
         idle_timeout: Duration::from_secs(30),
         busy_timeout: Duration::from_secs(5),
         create_if_missing: true,
      }
   }
}
