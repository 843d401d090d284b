//! Column, foreign key and index definitions.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, require_name};
use crate::{comment_line, indent};

/// A column definition inside `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Column {
   pub name: String,
   /// Free-form type name, e.g. `INTEGER` or `VARCHAR(32)`.
   pub data_type: String,
   #[serde(default)]
   pub primary_key: bool,
   #[serde(default)]
   pub unique: bool,
   #[serde(default)]
   pub not_null: bool,
   /// Default value as a SQL literal, emitted verbatim (`0`, `'n/a'`, `CURRENT_TIMESTAMP`).
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub default: Option<String>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub comment: Option<String>,
}

impl Column {
   pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
      Self {
         name: name.into(),
         data_type: data_type.into(),
         primary_key: false,
         unique: false,
         not_null: false,
         default: None,
         comment: None,
      }
   }

   pub fn primary_key(mut self) -> Self {
      self.primary_key = true;
      self
   }

   pub fn unique(mut self) -> Self {
      self.unique = true;
      self
   }

   pub fn not_null(mut self) -> Self {
      self.not_null = true;
      self
   }

   pub fn with_default(mut self, literal: impl Into<String>) -> Self {
      self.default = Some(literal.into());
      self
   }

   pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
      self.comment = Some(comment.into());
      self
   }

   pub fn validate(&self) -> Result<()> {
      require_name("column", &self.name)
   }

   /// Render as one indented column line, preceded by its comment line if any.
   ///
   /// Constraint keywords always appear in the order
   /// `UNIQUE`, `NOT NULL`, `DEFAULT`, `PRIMARY KEY`.
   pub fn to_sql(&self) -> String {
      let mut sql = format!("{} {}", self.name, self.data_type);

      if self.unique {
         sql.push_str(" UNIQUE");
      }
      if self.not_null {
         sql.push_str(" NOT NULL");
      }
      if let Some(default) = &self.default {
         sql.push_str(" DEFAULT ");
         sql.push_str(default);
      }
      if self.primary_key {
         sql.push_str(" PRIMARY KEY");
      }
      if let Some(comment) = &self.comment {
         sql = format!("{}\n{sql}", comment_line(&self.name, comment));
      }

      indent(&sql, 1)
   }
}

/// A table-level `FOREIGN KEY` constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignKey {
   /// Referenced table.
   pub reference_to: String,
   /// `(local column, referenced column)` pairs in key order.
   pub column_pairs: Vec<(String, String)>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub on_delete: Option<String>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub on_update: Option<String>,
}

impl ForeignKey {
   pub fn new<I, L, R>(reference_to: impl Into<String>, column_pairs: I) -> Self
   where
      I: IntoIterator<Item = (L, R)>,
      L: Into<String>,
      R: Into<String>,
   {
      Self {
         reference_to: reference_to.into(),
         column_pairs: column_pairs
            .into_iter()
            .map(|(local, referenced)| (local.into(), referenced.into()))
            .collect(),
         on_delete: None,
         on_update: None,
      }
   }

   pub fn on_delete(mut self, action: impl Into<String>) -> Self {
      self.on_delete = Some(action.into());
      self
   }

   pub fn on_update(mut self, action: impl Into<String>) -> Self {
      self.on_update = Some(action.into());
      self
   }

   pub fn validate(&self) -> Result<()> {
      require_name("referenced table", &self.reference_to)?;
      if self.column_pairs.is_empty() {
         return Err(Error::EmptyColumnPairs {
            reference_to: self.reference_to.clone(),
         });
      }
      Ok(())
   }

   pub fn to_sql(&self) -> String {
      let locals: Vec<&str> = self.column_pairs.iter().map(|(l, _)| l.as_str()).collect();
      let referenced: Vec<&str> = self.column_pairs.iter().map(|(_, r)| r.as_str()).collect();

      let mut sql = format!(
         "FOREIGN KEY ({}) REFERENCES {}({})",
         locals.join(", "),
         self.reference_to,
         referenced.join(", ")
      );

      if let Some(action) = &self.on_delete {
         sql.push_str(" ON DELETE ");
         sql.push_str(action);
      }
      if let Some(action) = &self.on_update {
         sql.push_str(" ON UPDATE ");
         sql.push_str(action);
      }

      indent(&sql, 1)
   }
}

/// A standalone index over one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Index {
   pub name: String,
   pub table: String,
   pub columns: Vec<String>,
   #[serde(default)]
   pub unique: bool,
}

impl Index {
   pub fn new<I, S>(name: impl Into<String>, table: impl Into<String>, columns: I) -> Self
   where
      I: IntoIterator<Item = S>,
      S: Into<String>,
   {
      Self {
         name: name.into(),
         table: table.into(),
         columns: columns.into_iter().map(Into::into).collect(),
         unique: false,
      }
   }

   pub fn unique(mut self) -> Self {
      self.unique = true;
      self
   }

   pub fn validate(&self) -> Result<()> {
      require_name("index", &self.name)?;
      require_name("table", &self.table)?;
      if self.columns.is_empty() {
         return Err(Error::EmptyIndexColumns {
            index: self.name.clone(),
         });
      }
      Ok(())
   }

   pub fn to_sql(&self) -> String {
      format!(
         "CREATE {}INDEX {} ON {} ({});",
         if self.unique { "UNIQUE " } else { "" },
         self.name,
         self.table,
         self.columns.join(", ")
      )
   }
}
