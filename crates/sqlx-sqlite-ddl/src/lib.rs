//! # sqlx-sqlite-ddl
//!
//! Typed SQLite schema-change statements.
//!
//! Each statement renders itself to canonical SQL with `to_sql()`. Rendering
//! is pure: it never touches a database and always produces the same text for
//! the same value. Use `validate()` (or [`SchemaChangeSet::to_sql_scripts`])
//! to reject malformed statements before executing anything.
//!
//! The serde representation is the wire schema: a JSON array of objects
//! tagged by `action`.
//!
//! ```
//! use sqlx_sqlite_ddl::{Column, CreateTable, SchemaChangeSet};
//!
//! let mut changes = SchemaChangeSet::new();
//! changes.push(
//!    CreateTable::new("users")
//!       .with_column(Column::new("id", "INTEGER").primary_key())
//!       .with_column(Column::new("email", "TEXT").unique().not_null()),
//! );
//!
//! let scripts = changes.to_sql_scripts().unwrap();
//! assert_eq!(
//!    scripts[0],
//!    "CREATE TABLE users (\tid INTEGER PRIMARY KEY,\n\temail TEXT UNIQUE NOT NULL\n);"
//! );
//! ```

mod column;
mod error;
mod statement;

pub use column::{Column, ForeignKey, Index};
pub use error::{Error, Result};
pub use statement::{
   CreateIndex, CreateTable, CreateView, DropIndex, DropTable, DropView, RenameTable,
   SchemaChangeSet, SchemaStatement,
};

/// Prefix every line of `s` with `level` tabs.
pub(crate) fn indent(s: &str, level: usize) -> String {
   let prefix = "\t".repeat(level);
   s.split('\n')
      .map(|line| format!("{prefix}{line}"))
      .collect::<Vec<_>>()
      .join("\n")
}

/// `-- <name>: <comment>` with any further comment lines kept as SQL comments.
pub(crate) fn comment_line(name: &str, comment: &str) -> String {
   let mut lines = comment.lines();
   let first = lines.next().unwrap_or_default();
   let mut out = format!("-- {name}: {first}");
   for line in lines {
      out.push_str("\n-- ");
      out.push_str(line);
   }
   out
}
