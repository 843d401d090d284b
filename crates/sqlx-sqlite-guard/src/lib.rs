//! # sqlx-sqlite-guard
//!
//! Scoped SQLite authorizer hooks for the write connection managed by
//! `sqlx-sqlite-conn-mgr`.
//!
//! SQLite consults the authorizer while compiling each statement, so a denied
//! operation fails before it runs with `SQLITE_AUTH` ("not authorized"),
//! whatever SQL text it was written in.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sqlx_sqlite_conn_mgr::SqliteDatabase;
//! use sqlx_sqlite_guard::{AuthorizedWriteGuard, DenySchemaChanges};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!    let db = SqliteDatabase::connect("mydb.db", None).await?;
//!
//!    let mut writer = AuthorizedWriteGuard::acquire(&db, Arc::new(DenySchemaChanges)).await?;
//!    sqlx::raw_sql("INSERT INTO users (name) VALUES ('Alice')")
//!       .execute(&mut *writer)
//!       .await?;
//!
//!    // Fails with "not authorized"
//!    let denied = sqlx::raw_sql("DROP TABLE users").execute(&mut *writer).await;
//!    assert!(denied.is_err());
//!
//!    // Authorizer removed; the plain writer goes back to normal
//!    let writer = writer.release().await;
//!    drop(writer);
//!
//!    Ok(())
//! }
//! ```

mod action;
mod error;
mod guard;
mod hooks;
mod policy;

pub use action::AuthAction;
pub use error::{Error, Result};
pub use guard::AuthorizedWriteGuard;
pub use policy::{AuthContext, AuthDecision, AuthorizationPolicy, DenySchemaChanges};
