//! Validation errors for schema statements.

/// A statement that cannot be rendered into meaningful SQL.
///
/// Raised before anything touches the database.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
   /// An identifier that must be present is empty or blank.
   #[error("{kind} name must not be empty")]
   EmptyName { kind: &'static str },

   /// `CREATE TABLE` without any column definitions.
   #[error("table '{table}' must have at least one column")]
   EmptyColumns { table: String },

   /// A foreign key without any (local, referenced) column pairs.
   #[error("foreign key referencing '{reference_to}' must have at least one column pair")]
   EmptyColumnPairs { reference_to: String },

   /// An index that covers no columns.
   #[error("index '{index}' must cover at least one column")]
   EmptyIndexColumns { index: String },

   /// A view whose body is empty once whitespace and the trailing `;` are removed.
   #[error("view '{view}' has an empty body")]
   EmptyViewBody { view: String },
}

/// Result type alias for statement validation.
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn require_name(kind: &'static str, name: &str) -> Result<()> {
   if name.trim().is_empty() {
      return Err(Error::EmptyName { kind });
   }
   Ok(())
}
