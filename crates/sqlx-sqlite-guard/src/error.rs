//! Error types for the sqlx-sqlite-guard crate.

/// Errors that can occur while installing or removing an authorizer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// `sqlite3_set_authorizer` rejected the registration.
   #[error("Hook registration failed: {0}")]
   HookRegistration(String),

   /// SQLx database error.
   #[error("Database error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// Error from the connection manager while acquiring the writer.
   #[error(transparent)]
   ConnMgr(#[from] sqlx_sqlite_conn_mgr::Error),
}

/// Result type alias for guard operations.
pub type Result<T> = std::result::Result<T, Error>;
