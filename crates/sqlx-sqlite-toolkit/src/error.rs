/// Result type alias for toolkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SQLite primary result code for an authorizer denial (`SQLITE_AUTH`).
const SQLITE_AUTH: &str = "23";

/// Error types for guarded database operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// The engine rejected rendered or raw SQL.
   ///
   /// Schema changes denied on the modification path also land here, with
   /// SQLite code 23 and a "not authorized" message; see
   /// [`is_policy_violation`](Self::is_policy_violation).
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the connection manager.
   #[error(transparent)]
   ConnectionManager(#[from] sqlx_sqlite_conn_mgr::Error),

   /// Error installing or removing the authorizer.
   #[error(transparent)]
   Guard(#[from] sqlx_sqlite_guard::Error),

   /// A schema statement was malformed; nothing was executed.
   #[error("invalid schema statement: {0}")]
   Validation(#[from] sqlx_sqlite_ddl::Error),

   /// Introspection was requested for a table missing from the catalog.
   #[error("table not found: {0}")]
   TableNotFound(String),

   /// The catalog reported an object type this crate does not model.
   #[error("unknown catalog object type: {0}")]
   UnknownObjectType(String),

   /// SQLite type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// Transaction failed and rollback also failed.
   #[error("transaction failed: {transaction_error}; rollback also failed: {rollback_error}")]
   TransactionRollbackFailed {
      transaction_error: String,
      rollback_error: String,
   },
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => sqlx_error_code(e),
         Error::ConnectionManager(sqlx_sqlite_conn_mgr::Error::Sqlx(e)) => sqlx_error_code(e),
         Error::ConnectionManager(_) => "CONNECTION_ERROR".to_string(),
         Error::Guard(sqlx_sqlite_guard::Error::Sqlx(e)) => sqlx_error_code(e),
         Error::Guard(_) => "GUARD_ERROR".to_string(),
         Error::Validation(_) => "VALIDATION_ERROR".to_string(),
         Error::TableNotFound(_) => "TABLE_NOT_FOUND".to_string(),
         Error::UnknownObjectType(_) => "UNKNOWN_OBJECT_TYPE".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
         Error::TransactionRollbackFailed { .. } => "TRANSACTION_ROLLBACK_FAILED".to_string(),
      }
   }

   /// Whether this is an authorizer denial, i.e. a schema change attempted
   /// through the modification path.
   pub fn is_policy_violation(&self) -> bool {
      match self {
         Error::Sqlx(e) => e
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .is_some_and(|code| code == SQLITE_AUTH),
         _ => false,
      }
   }
}

fn sqlx_error_code(e: &sqlx::Error) -> String {
   if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
      return format!("SQLITE_{}", code);
   }
   "SQLX_ERROR".to_string()
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_validation() {
      let err = Error::from(sqlx_sqlite_ddl::Error::EmptyColumns {
         table: "users".into(),
      });
      assert_eq!(err.error_code(), "VALIDATION_ERROR");
      assert!(err.to_string().contains("users"));
      assert!(!err.is_policy_violation());
   }

   #[test]
   fn test_error_code_table_not_found() {
      let err = Error::TableNotFound("missing".into());
      assert_eq!(err.error_code(), "TABLE_NOT_FOUND");
      assert_eq!(err.to_string(), "table not found: missing");
   }

   #[test]
   fn test_error_code_transaction_rollback_failed() {
      let err = Error::TransactionRollbackFailed {
         transaction_error: "constraint".into(),
         rollback_error: "busy".into(),
      };
      assert_eq!(err.error_code(), "TRANSACTION_ROLLBACK_FAILED");
      assert!(err.to_string().contains("constraint"));
      assert!(err.to_string().contains("busy"));
   }

   #[test]
   fn test_error_code_connection_closed() {
      let err = Error::from(sqlx_sqlite_conn_mgr::Error::DatabaseClosed);
      assert_eq!(err.error_code(), "CONNECTION_ERROR");
   }

   #[test]
   fn test_error_code_sqlx_non_database() {
      // RowNotFound is not a database error, so no SQLite code
      let err = Error::Sqlx(sqlx::Error::RowNotFound);
      assert_eq!(err.error_code(), "SQLX_ERROR");
      assert!(!err.is_policy_violation());
   }

   #[test]
   fn test_error_code_unsupported_datatype() {
      let err = Error::UnsupportedDatatype("WEIRD".into());
      assert_eq!(err.error_code(), "UNSUPPORTED_DATATYPE");
   }
}
