//! Errors raised while opening or using a [`SqliteDatabase`](crate::SqliteDatabase)

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
   /// Creating the parent directories of the database file failed.
   #[error("IO error: {0}")]
   Io(#[from] std::io::Error),

   /// Opening a handle, acquiring a connection, or a query on one failed.
   #[error("Sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// [`close`](crate::SqliteDatabase::close) already ran. Both handles are
   /// gone for good; a new `connect` is needed to use the file again.
   #[error("Database is closed; reconnect to use it again")]
   DatabaseClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
