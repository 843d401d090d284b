//! # sqlx-sqlite-toolkit
//!
//! Policy-guarded access to a SQLite file, built on `sqlx-sqlite-conn-mgr`,
//! `sqlx-sqlite-ddl` and `sqlx-sqlite-guard`.
//!
//! ## Core Types
//!
//! - **[`GuardedDatabase`]**: Schema changes, data changes, reads and introspection
//! - **[`CatalogObject`]** / **[`ResolvedForeignKey`]**: Structured catalog descriptions
//! - **[`JsonRow`]**: A result row as an ordered column-to-JSON map
//! - **[`Error`]**: Error type with machine-readable codes
//!
//! ## Example
//!
//! ```no_run
//! use sqlx_sqlite_ddl::{Column, CreateTable, SchemaChangeSet};
//! use sqlx_sqlite_toolkit::GuardedDatabase;
//!
//! # async fn example() -> sqlx_sqlite_toolkit::Result<()> {
//! let db = GuardedDatabase::connect("app.db", None).await?;
//!
//! let mut changes = SchemaChangeSet::new();
//! changes.push(
//!    CreateTable::new("notes")
//!       .with_column(Column::new("id", "INTEGER").primary_key())
//!       .with_column(Column::new("body", "TEXT").not_null()),
//! );
//! db.apply_schema(&changes).await?;
//!
//! db.apply_modification("INSERT INTO notes (body) VALUES ('hello')").await?;
//!
//! // Schema changes are refused on the modification path
//! let err = db.apply_modification("DROP TABLE notes").await.unwrap_err();
//! assert!(err.is_policy_violation());
//!
//! let rows = db.query("SELECT * FROM notes").await?;
//! assert_eq!(rows[0]["body"], "hello");
//!
//! db.close().await?;
//! # Ok(())
//! # }
//! ```

mod decode;
mod error;
mod introspect;
mod wrapper;

pub use decode::JsonRow;
pub use error::{Error, Result};
pub use introspect::{
   CatalogObject, ObjectType, ResolvedForeignKey, describe_all, describe_table, list_tables,
   query_foreign_keys,
};
pub use wrapper::GuardedDatabase;
