//! Schema statements and ordered change sets.

use serde::{Deserialize, Serialize};

use crate::column::{Column, ForeignKey, Index};
use crate::comment_line;
use crate::error::{Error, Result, require_name};

/// `CREATE TABLE` with its columns, table-level foreign keys and trailing indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTable {
   pub table_name: String,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub comment: Option<String>,
   pub columns: Vec<Column>,
   #[serde(default)]
   pub foreign_keys: Vec<ForeignKey>,
   #[serde(default)]
   pub indexes: Vec<Index>,
}

impl CreateTable {
   pub fn new(table_name: impl Into<String>) -> Self {
      Self {
         table_name: table_name.into(),
         comment: None,
         columns: Vec::new(),
         foreign_keys: Vec::new(),
         indexes: Vec::new(),
      }
   }

   pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
      self.comment = Some(comment.into());
      self
   }

   pub fn with_column(mut self, column: Column) -> Self {
      self.columns.push(column);
      self
   }

   pub fn with_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
      self.foreign_keys.push(foreign_key);
      self
   }

   pub fn with_index(mut self, index: Index) -> Self {
      self.indexes.push(index);
      self
   }

   pub fn validate(&self) -> Result<()> {
      require_name("table", &self.table_name)?;
      if self.columns.is_empty() {
         return Err(Error::EmptyColumns {
            table: self.table_name.clone(),
         });
      }
      self.columns.iter().try_for_each(Column::validate)?;
      self.foreign_keys.iter().try_for_each(ForeignKey::validate)?;
      self.indexes.iter().try_for_each(Index::validate)
   }

   /// Render the table, then one `CREATE INDEX` per configured index after a
   /// blank line.
   pub fn to_sql(&self) -> String {
      let mut sql = String::new();

      if let Some(comment) = &self.comment {
         sql.push_str(&comment_line(&self.table_name, comment));
         sql.push('\n');
      }

      sql.push_str(&format!("CREATE TABLE {} (", self.table_name));

      let definitions: Vec<String> = self
         .columns
         .iter()
         .map(Column::to_sql)
         .chain(self.foreign_keys.iter().map(ForeignKey::to_sql))
         .collect();

      sql.push_str(&definitions.join(",\n"));
      sql.push_str("\n);");

      if !self.indexes.is_empty() {
         let indexes: Vec<String> = self.indexes.iter().map(Index::to_sql).collect();
         sql.push_str("\n\n");
         sql.push_str(&indexes.join("\n"));
      }

      sql
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropTable {
   pub table_name: String,
}

impl DropTable {
   pub fn new(table_name: impl Into<String>) -> Self {
      Self {
         table_name: table_name.into(),
      }
   }

   pub fn to_sql(&self) -> String {
      format!("DROP TABLE {};", self.table_name)
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameTable {
   pub old_name: String,
   pub new_name: String,
}

impl RenameTable {
   pub fn new(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
      Self {
         old_name: old_name.into(),
         new_name: new_name.into(),
      }
   }

   pub fn to_sql(&self) -> String {
      format!("ALTER TABLE {} RENAME TO {};", self.old_name, self.new_name)
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateIndex {
   pub index: Index,
}

impl CreateIndex {
   pub fn new(index: Index) -> Self {
      Self { index }
   }

   pub fn to_sql(&self) -> String {
      self.index.to_sql()
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropIndex {
   pub index_name: String,
}

impl DropIndex {
   pub fn new(index_name: impl Into<String>) -> Self {
      Self {
         index_name: index_name.into(),
      }
   }

   pub fn to_sql(&self) -> String {
      format!("DROP INDEX {};", self.index_name)
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateView {
   pub view_name: String,
   /// The `SELECT` the view is defined by. Surrounding whitespace and one
   /// trailing `;` are dropped when rendering.
   pub sql: String,
}

impl CreateView {
   pub fn new(view_name: impl Into<String>, sql: impl Into<String>) -> Self {
      Self {
         view_name: view_name.into(),
         sql: sql.into(),
      }
   }

   fn body(&self) -> &str {
      let body = self.sql.trim();
      match body.strip_suffix(';') {
         Some(stripped) => stripped.trim(),
         None => body,
      }
   }

   pub fn validate(&self) -> Result<()> {
      require_name("view", &self.view_name)?;
      if self.body().is_empty() {
         return Err(Error::EmptyViewBody {
            view: self.view_name.clone(),
         });
      }
      Ok(())
   }

   pub fn to_sql(&self) -> String {
      format!("CREATE VIEW {} AS {};", self.view_name, self.body())
   }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropView {
   pub view_name: String,
}

impl DropView {
   pub fn new(view_name: impl Into<String>) -> Self {
      Self {
         view_name: view_name.into(),
      }
   }

   pub fn to_sql(&self) -> String {
      format!("DROP VIEW {};", self.view_name)
   }
}

/// One schema change, tagged on the wire by its `action` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SchemaStatement {
   CreateTable(CreateTable),
   DropTable(DropTable),
   RenameTable(RenameTable),
   CreateIndex(CreateIndex),
   DropIndex(DropIndex),
   CreateView(CreateView),
   DropView(DropView),
}

impl SchemaStatement {
   /// The wire `action` tag for this statement.
   pub fn action(&self) -> &'static str {
      match self {
         SchemaStatement::CreateTable(_) => "create_table",
         SchemaStatement::DropTable(_) => "drop_table",
         SchemaStatement::RenameTable(_) => "rename_table",
         SchemaStatement::CreateIndex(_) => "create_index",
         SchemaStatement::DropIndex(_) => "drop_index",
         SchemaStatement::CreateView(_) => "create_view",
         SchemaStatement::DropView(_) => "drop_view",
      }
   }

   pub fn validate(&self) -> Result<()> {
      match self {
         SchemaStatement::CreateTable(s) => s.validate(),
         SchemaStatement::DropTable(s) => require_name("table", &s.table_name),
         SchemaStatement::RenameTable(s) => {
            require_name("table", &s.old_name)?;
            require_name("table", &s.new_name)
         }
         SchemaStatement::CreateIndex(s) => s.index.validate(),
         SchemaStatement::DropIndex(s) => require_name("index", &s.index_name),
         SchemaStatement::CreateView(s) => s.validate(),
         SchemaStatement::DropView(s) => require_name("view", &s.view_name),
      }
   }

   pub fn to_sql(&self) -> String {
      match self {
         SchemaStatement::CreateTable(s) => s.to_sql(),
         SchemaStatement::DropTable(s) => s.to_sql(),
         SchemaStatement::RenameTable(s) => s.to_sql(),
         SchemaStatement::CreateIndex(s) => s.to_sql(),
         SchemaStatement::DropIndex(s) => s.to_sql(),
         SchemaStatement::CreateView(s) => s.to_sql(),
         SchemaStatement::DropView(s) => s.to_sql(),
      }
   }
}

macro_rules! impl_from_statement {
   ($($variant:ident),* $(,)?) => {
      $(
         impl From<$variant> for SchemaStatement {
            fn from(statement: $variant) -> Self {
               SchemaStatement::$variant(statement)
            }
         }
      )*
   };
}

impl_from_statement!(
   CreateTable,
   DropTable,
   RenameTable,
   CreateIndex,
   DropIndex,
   CreateView,
   DropView,
);

/// An ordered list of schema statements applied as one unit.
///
/// Order is preserved exactly; a table must be created before an index on
/// it. On the wire this is a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaChangeSet(Vec<SchemaStatement>);

impl SchemaChangeSet {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn push(&mut self, statement: impl Into<SchemaStatement>) {
      self.0.push(statement.into());
   }

   pub fn statements(&self) -> &[SchemaStatement] {
      &self.0
   }

   pub fn len(&self) -> usize {
      self.0.len()
   }

   pub fn is_empty(&self) -> bool {
      self.0.is_empty()
   }

   /// Validate every statement, stopping at the first malformed one.
   pub fn validate(&self) -> Result<()> {
      self.0.iter().try_for_each(SchemaStatement::validate)
   }

   /// Validate, then render each statement to its own script, in order.
   pub fn to_sql_scripts(&self) -> Result<Vec<String>> {
      self.validate()?;
      Ok(self.0.iter().map(SchemaStatement::to_sql).collect())
   }
}

impl From<Vec<SchemaStatement>> for SchemaChangeSet {
   fn from(statements: Vec<SchemaStatement>) -> Self {
      Self(statements)
   }
}

impl FromIterator<SchemaStatement> for SchemaChangeSet {
   fn from_iter<I: IntoIterator<Item = SchemaStatement>>(iter: I) -> Self {
      Self(iter.into_iter().collect())
   }
}

impl IntoIterator for SchemaChangeSet {
   type Item = SchemaStatement;
   type IntoIter = std::vec::IntoIter<SchemaStatement>;

   fn into_iter(self) -> Self::IntoIter {
      self.0.into_iter()
   }
}

impl<'a> IntoIterator for &'a SchemaChangeSet {
   type Item = &'a SchemaStatement;
   type IntoIter = std::slice::Iter<'a, SchemaStatement>;

   fn into_iter(self) -> Self::IntoIter {
      self.0.iter()
   }
}
