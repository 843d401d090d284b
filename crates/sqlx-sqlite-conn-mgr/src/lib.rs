//! # sqlx-sqlite-conn-mgr
//!
//! A minimal wrapper around SQLx that opens one SQLite file through two
//! handles with different capabilities.
//!
//! ## Core Types
//!
//! - **[`SqliteDatabase`]**: Database with a pinned read-write connection and a read-only pool
//! - **[`SqliteDatabaseConfig`]**: Configuration for pool size, timeouts and file creation
//! - **[`WriteGuard`]**: RAII guard ensuring exclusive write access
//! - **[`Error`]**: Error type for database operations
//!
//! ## Architecture
//!
//! - **Read-write handle**: A single-connection pool, WAL journal mode and
//!   foreign key enforcement enabled when the database is opened
//! - **Read-only handle**: Connections opened with `SQLITE_OPEN_READONLY`, so
//!   nothing issued through them can modify the file regardless of SQL text
//! - **Exclusive writes**: The single write connection serializes writers in
//!   this process; SQLite's own locking serializes writers across processes

mod config;
mod database;
mod error;
mod write_guard;

// Re-export public types
pub use config::SqliteDatabaseConfig;
pub use database::SqliteDatabase;
pub use error::{Error, Result};
pub use write_guard::WriteGuard;
