//! SQLite database with a pinned read-write connection and a read-only pool

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{debug, warn};

use crate::config::SqliteDatabaseConfig;
use crate::error::{Error, Result};
use crate::write_guard::WriteGuard;

/// SQLite database opened through two handles with distinct capabilities.
///
/// ## Architecture
///
/// The database maintains two connection pools over the same file:
/// - **`write_conn`**: Single-connection pool (max_connections=1, never idles
///   out) opened read-write, with WAL journal mode and foreign key enforcement
/// - **`read_pool`**: Pool of connections opened with `SQLITE_OPEN_READONLY`
///   and foreign key enforcement
///
/// The write connection is established first so the file exists and is in
/// WAL mode before any read-only connection opens it.
///
/// Every time the write connection goes back to its pool it is reset: an
/// open transaction is rolled back and foreign key enforcement is turned
/// back on. A writer whose future was dropped mid-call therefore never hands
/// its transaction or pragma state to the next writer.
///
/// ## State Management
///
/// - **`closed`**: Prevents use after the database has been closed
/// - **`path`**: Database file path
///
/// ## Usage Pattern
///
/// ```text
/// 1. Connect (opens the write connection, enables WAL, builds the read pool)
/// 2. Read operations: use read_pool()
/// 3. Write operations: acquire_writer() for exclusive access
/// 4. Close database when done
/// ```
#[derive(Debug)]
pub struct SqliteDatabase {
   /// Pool of read-only connections for queries
   read_pool: Pool<Sqlite>,

   /// Single read-write connection pool (max_connections=1) for serialized writes
   write_conn: Pool<Sqlite>,

   /// Marks database as closed to prevent further operations
   closed: AtomicBool,

   /// Path to database file
   path: PathBuf,
}

impl SqliteDatabase {
   /// Open `path` with one read-write handle and one read-only pool.
   ///
   /// Both handles enable `PRAGMA foreign_keys`; the read-write handle also
   /// switches the file to WAL journal mode.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Arc<Self>> {
      let config = custom_config.unwrap_or_default();
      let path = path.as_ref().to_path_buf();

      if config.create_if_missing
         && let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
      {
         tokio::fs::create_dir_all(parent).await?;
      }

      let write_options = SqliteConnectOptions::new()
         .filename(&path)
         .create_if_missing(config.create_if_missing)
         .foreign_keys(true)
         .journal_mode(SqliteJournalMode::Wal)
         .busy_timeout(config.busy_timeout);

      // connect_with establishes the first connection eagerly, which applies
      // the WAL pragma before the read-only pool is created.
      let write_conn = SqlitePoolOptions::new()
         .max_connections(1)
         .min_connections(1)
         .idle_timeout(None)
         .max_lifetime(None)
         .after_release(|conn, _meta| Box::pin(reset_write_connection(conn)))
         .connect_with(write_options)
         .await?;

      debug!(path = %path.display(), "Opened read-write connection in WAL mode");

      let read_options = SqliteConnectOptions::new()
         .filename(&path)
         .read_only(true)
         .foreign_keys(true)
         .busy_timeout(config.busy_timeout);

      let read_pool = match SqlitePoolOptions::new()
         .max_connections(config.max_read_connections.max(1))
         .idle_timeout(config.idle_timeout)
         .connect_with(read_options)
         .await
      {
         Ok(pool) => pool,
         Err(e) => {
            write_conn.close().await;
            return Err(Error::Sqlx(e));
         }
      };

      debug!(
         path = %path.display(),
         max_read_connections = config.max_read_connections,
         "Opened read-only pool"
      );

      Ok(Arc::new(Self {
         read_pool,
         write_conn,
         closed: AtomicBool::new(false),
         path,
      }))
   }

   /// Get a reference to the read-only connection pool.
   pub fn read_pool(&self) -> Result<&Pool<Sqlite>> {
      self.ensure_open()?;
      Ok(&self.read_pool)
   }

   /// Acquire exclusive access to the read-write connection.
   ///
   /// Waits while another `WriteGuard` from this database is alive.
   pub async fn acquire_writer(&self) -> Result<WriteGuard> {
      self.ensure_open()?;
      let conn = self.write_conn.acquire().await?;
      Ok(WriteGuard::new(conn))
   }

   /// Path of the backing database file.
   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Whether [`close`](Self::close) has been called.
   pub fn is_closed(&self) -> bool {
      self.closed.load(Ordering::Acquire)
   }

   /// Close both handles.
   ///
   /// Calling this more than once is a no-op. The read-only pool closes first
   /// so the write connection is the last one on the file and checkpoints the
   /// WAL.
   pub async fn close(&self) -> Result<()> {
      if self.closed.swap(true, Ordering::AcqRel) {
         return Ok(());
      }

      self.read_pool.close().await;
      self.write_conn.close().await;

      debug!(path = %self.path.display(), "Closed database");
      Ok(())
   }

   fn ensure_open(&self) -> Result<()> {
      if self.is_closed() {
         return Err(Error::DatabaseClosed);
      }
      Ok(())
   }
}

/// Undo whatever an interrupted writer left on the connection.
///
/// Runs before the connection is available to the next `acquire_writer`.
/// Returning an error makes the pool discard the connection and open a new
/// one.
async fn reset_write_connection(conn: &mut SqliteConnection) -> sqlx::Result<bool> {
   let in_transaction = {
      let mut handle = conn.lock_handle().await?;
      // SAFETY: the handle lock keeps the worker thread off the connection.
      unsafe { libsqlite3_sys::sqlite3_get_autocommit(handle.as_raw_handle().as_ptr()) == 0 }
   };

   if in_transaction {
      warn!("Write connection returned inside a transaction; rolling back");
      sqlx::query("ROLLBACK").execute(&mut *conn).await?;
   }

   let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
      .fetch_one(&mut *conn)
      .await?;

   if foreign_keys == 0 {
      warn!("Write connection returned with foreign keys off; re-enabling");
      sqlx::query("PRAGMA foreign_keys = ON")
         .execute(&mut *conn)
         .await?;
   }

   Ok(true)
}
