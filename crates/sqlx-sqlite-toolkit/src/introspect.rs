//! Catalog introspection for SQLite databases.
//!
//! Reads `sqlite_master` and `pragma_foreign_key_list` into structured
//! descriptions. All functions take a plain connection so they can run on the
//! read-only pool.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::trace;

use crate::{Error, Result};

/// Kind of schema object recorded in `sqlite_master`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
   Table,
   Index,
   View,
   Trigger,
}

impl ObjectType {
   pub fn as_str(self) -> &'static str {
      match self {
         ObjectType::Table => "table",
         ObjectType::Index => "index",
         ObjectType::View => "view",
         ObjectType::Trigger => "trigger",
      }
   }
}

impl FromStr for ObjectType {
   type Err = Error;

   fn from_str(s: &str) -> Result<Self> {
      match s {
         "table" => Ok(ObjectType::Table),
         "index" => Ok(ObjectType::Index),
         "view" => Ok(ObjectType::View),
         "trigger" => Ok(ObjectType::Trigger),
         other => Err(Error::UnknownObjectType(other.to_string())),
      }
   }
}

impl fmt::Display for ObjectType {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

/// One foreign key constraint as SQLite reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedForeignKey {
   /// Constraint id from `pragma_foreign_key_list`, unique within the table.
   pub id: i64,
   /// Table that owns the constraint.
   pub table: String,
   pub referenced_table: String,
   /// `(owning column, referenced column)` pairs in key order. The referenced
   /// column is `None` when the constraint targets the parent's primary key
   /// implicitly (`REFERENCES parent` with no column list).
   pub columns: Vec<(String, Option<String>)>,
   pub on_update: String,
   pub on_delete: String,
   #[serde(rename = "match")]
   pub match_type: String,
}

/// One `sqlite_master` row plus its resolved foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogObject {
   #[serde(rename = "type")]
   pub object_type: ObjectType,
   pub name: String,
   pub tbl_name: String,
   /// B-tree root page; `None` for views, triggers and virtual tables.
   pub root_page: Option<i64>,
   /// The statement that created the object, as stored by SQLite. `None`
   /// for objects SQLite created implicitly (autoindexes).
   pub sql: Option<String>,
   pub foreign_keys: Vec<ResolvedForeignKey>,
}

type MasterRow = (String, String, String, Option<i64>, Option<String>);

type ForeignKeyRow = (
   i64,
   i64,
   String,
   String,
   Option<String>,
   String,
   String,
   String,
);

/// Names of all tables in the catalog, in SQLite's enumeration order.
pub async fn list_tables(conn: &mut SqliteConnection) -> Result<Vec<String>> {
   let names = sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
      .fetch_all(&mut *conn)
      .await?;
   Ok(names)
}

/// Describe one table.
///
/// Returns an empty list if the table does not exist; absence is not an
/// error here.
pub async fn describe_table(
   conn: &mut SqliteConnection,
   table_name: &str,
) -> Result<Vec<CatalogObject>> {
   let rows: Vec<MasterRow> = sqlx::query_as(
      "SELECT type, name, tbl_name, rootpage, sql FROM sqlite_master \
       WHERE type = 'table' AND name = ?1",
   )
   .bind(table_name)
   .fetch_all(&mut *conn)
   .await?;

   if rows.is_empty() {
      trace!(table = %table_name, "Table not found in catalog");
   }

   let mut objects = Vec::with_capacity(rows.len());
   for (object_type, name, tbl_name, root_page, sql) in rows {
      let foreign_keys = resolve_foreign_keys(conn, &name).await?;
      objects.push(CatalogObject {
         object_type: object_type.parse()?,
         name,
         tbl_name,
         root_page: root_page.filter(|page| *page != 0),
         sql,
         foreign_keys,
      });
   }

   Ok(objects)
}

/// Describe every table, in [`list_tables`] order.
pub async fn describe_all(conn: &mut SqliteConnection) -> Result<Vec<CatalogObject>> {
   let mut objects = Vec::new();
   for table in list_tables(conn).await? {
      objects.extend(describe_table(conn, &table).await?);
   }
   Ok(objects)
}

/// Foreign keys of `table_name`.
///
/// Fails with [`Error::TableNotFound`] when the table is not in the catalog,
/// which is distinct from an existing table with no foreign keys (empty list).
pub async fn query_foreign_keys(
   conn: &mut SqliteConnection,
   table_name: &str,
) -> Result<Vec<ResolvedForeignKey>> {
   let exists: Option<i64> =
      sqlx::query_scalar("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")
         .bind(table_name)
         .fetch_optional(&mut *conn)
         .await?;

   if exists.is_none() {
      return Err(Error::TableNotFound(table_name.to_string()));
   }

   resolve_foreign_keys(conn, table_name).await
}

/// Groups `pragma_foreign_key_list` rows into one entry per constraint.
///
/// Rows are keyed by constraint id rather than referenced table, so two
/// constraints pointing at the same parent keep their own actions.
async fn resolve_foreign_keys(
   conn: &mut SqliteConnection,
   table_name: &str,
) -> Result<Vec<ResolvedForeignKey>> {
   let rows: Vec<ForeignKeyRow> = sqlx::query_as(
      r#"SELECT id, seq, "table", "from", "to", on_update, on_delete, "match"
         FROM pragma_foreign_key_list(?1)
         ORDER BY id, seq"#,
   )
   .bind(table_name)
   .fetch_all(&mut *conn)
   .await?;

   let mut grouped: IndexMap<i64, ResolvedForeignKey> = IndexMap::new();
   for (id, _seq, referenced_table, from, to, on_update, on_delete, match_type) in rows {
      grouped
         .entry(id)
         .or_insert_with(|| ResolvedForeignKey {
            id,
            table: table_name.to_string(),
            referenced_table,
            columns: Vec::new(),
            on_update,
            on_delete,
            match_type,
         })
         .columns
         .push((from, to));
   }

   Ok(grouped.into_values().collect())
}
