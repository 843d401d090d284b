//! Exclusive access to the read-write connection

use std::ops::{Deref, DerefMut};

use sqlx::Sqlite;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteConnection;
use tracing::trace;

/// RAII guard for the single read-write connection.
///
/// The write pool holds exactly one connection, so while a `WriteGuard` is
/// alive every other writer in this process waits in
/// [`SqliteDatabase::acquire_writer`](crate::SqliteDatabase::acquire_writer).
/// Dropping the guard returns the connection to the pool.
#[must_use = "if unused, the write lock is immediately released"]
#[derive(Debug)]
pub struct WriteGuard {
   conn: PoolConnection<Sqlite>,
}

impl WriteGuard {
   pub(crate) fn new(conn: PoolConnection<Sqlite>) -> Self {
      trace!("Write connection acquired");
      Self { conn }
   }
}

impl Deref for WriteGuard {
   type Target = SqliteConnection;

   fn deref(&self) -> &Self::Target {
      &self.conn
   }
}

impl DerefMut for WriteGuard {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut self.conn
   }
}

impl Drop for WriteGuard {
   fn drop(&mut self) {
      trace!("Write connection released");
   }
}
