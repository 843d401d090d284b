use std::path::Path;
use std::sync::Arc;

use futures::TryStreamExt;
use serde_json::Value as JsonValue;
use sqlx::Either;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx_sqlite_conn_mgr::{SqliteDatabase, SqliteDatabaseConfig};
use sqlx_sqlite_ddl::SchemaChangeSet;
use sqlx_sqlite_guard::{AuthorizationPolicy, AuthorizedWriteGuard, DenySchemaChanges};
use tracing::{debug, warn};

use crate::decode::{JsonRow, decode_rows};
use crate::introspect::{self, CatalogObject, ResolvedForeignKey};
use crate::{Error, Result};

/// Guarded access to one SQLite file.
///
/// - **Schema changes** go through [`apply_schema`](Self::apply_schema) as
///   typed statements, executed in one transaction with foreign key
///   enforcement suspended.
/// - **Data changes** go through
///   [`apply_modification`](Self::apply_modification) with an authorizer
///   installed that denies any schema-altering operation.
/// - **Reads** go through [`query`](Self::query) on the read-only pool and can
///   never modify the file.
///
/// No transaction is held open between calls. If a caller drops one of the
/// `apply_*` futures midway, the write connection's transaction is rolled
/// back and foreign keys are re-enabled before the next writer can use it.
pub struct GuardedDatabase {
   inner: Arc<SqliteDatabase>,
   policy: Arc<dyn AuthorizationPolicy>,
}

impl GuardedDatabase {
   /// Open the database file at `path`.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Self> {
      let db = SqliteDatabase::connect(path, custom_config).await?;
      Ok(Self::from_database(db))
   }

   /// Wrap an already opened database, denying schema changes on the
   /// modification path.
   pub fn from_database(db: Arc<SqliteDatabase>) -> Self {
      Self::with_policy(db, Arc::new(DenySchemaChanges))
   }

   /// Wrap an already opened database with a custom modification policy.
   pub fn with_policy(db: Arc<SqliteDatabase>, policy: Arc<dyn AuthorizationPolicy>) -> Self {
      Self { inner: db, policy }
   }

   /// Get the underlying `SqliteDatabase`.
   pub fn inner(&self) -> &Arc<SqliteDatabase> {
      &self.inner
   }

   /// Apply a change set atomically.
   ///
   /// This method:
   /// 1. Validates and renders every statement (nothing runs if any is malformed)
   /// 2. Turns `PRAGMA foreign_keys` off on the write connection
   /// 3. Begins a transaction and runs each statement's script in order
   /// 4. Commits on success, rolls back on the first error
   /// 5. Turns `PRAGMA foreign_keys` back on, on every path
   ///
   /// The engine error that aborted the set is returned unchanged.
   pub async fn apply_schema(&self, changes: &SchemaChangeSet) -> Result<()> {
      let scripts = changes.to_sql_scripts()?;

      let mut writer = self.inner.acquire_writer().await?;

      sqlx::query("PRAGMA foreign_keys = OFF")
         .execute(&mut *writer)
         .await?;
      debug!("Foreign key enforcement suspended for schema change");

      let outcome: Result<()> = async {
         sqlx::query("BEGIN IMMEDIATE").execute(&mut *writer).await?;
         debug!(statements = scripts.len(), "Schema transaction started");

         let result = async {
            for script in &scripts {
               sqlx::raw_sql(script).execute(&mut *writer).await?;
            }
            Ok::<(), Error>(())
         }
         .await;

         finish_transaction(&mut writer, result).await
      }
      .await;

      // Restore enforcement regardless of outcome; the original error wins.
      let restored = sqlx::query("PRAGMA foreign_keys = ON")
         .execute(&mut *writer)
         .await;

      match (outcome, restored) {
         (Err(e), Err(restore_err)) => {
            warn!(error = %restore_err, "Failed to re-enable foreign keys after failed schema change");
            Err(e)
         }
         (Err(e), Ok(_)) => Err(e),
         (Ok(()), Err(restore_err)) => Err(Error::Sqlx(restore_err)),
         (Ok(()), Ok(_)) => {
            debug!("Foreign key enforcement restored");
            Ok(())
         }
      }
   }

   /// Run a data-modification script in one transaction.
   ///
   /// While the script runs, an authorizer on the write connection denies
   /// every schema-altering operation (create/drop/alter of tables, indexes,
   /// triggers and views, temp variants included). A denied statement fails
   /// with SQLite's "not authorized" error and the whole script is rolled
   /// back. The authorizer is removed before this method returns, on success
   /// and on failure.
   ///
   /// **Only the last statement's rows are returned.** For a script like
   /// `INSERT ...; SELECT ...;` that is the `SELECT` result; for a script
   /// ending in `INSERT`/`UPDATE`/`DELETE` without `RETURNING` it is an empty
   /// list, even if earlier statements produced rows.
   pub async fn apply_modification(&self, sql: &str) -> Result<Vec<JsonRow>> {
      let mut writer = AuthorizedWriteGuard::acquire(&self.inner, Arc::clone(&self.policy)).await?;

      let outcome: Result<Vec<SqliteRow>> = async {
         sqlx::query("BEGIN IMMEDIATE").execute(&mut *writer).await?;
         debug!("Modification transaction started");

         let result = execute_script(&mut writer, sql).await;
         finish_transaction(&mut writer, result).await
      }
      .await;

      // Authorizer removed before the writer goes back to the pool
      drop(writer.release().await);

      decode_rows(outcome?)
   }

   /// Execute a read query on the read-only pool.
   ///
   /// No transaction is opened; the query sees the latest committed state.
   /// An empty result is an empty list.
   pub async fn query(&self, sql: &str) -> Result<Vec<JsonRow>> {
      self.query_with(sql, Vec::new()).await
   }

   /// Execute a read query with positional bind values.
   pub async fn query_with(&self, sql: &str, values: Vec<JsonValue>) -> Result<Vec<JsonRow>> {
      let pool = self.inner.read_pool()?;

      let mut q = sqlx::query(sql);
      for value in values {
         q = bind_value(q, value);
      }

      let rows = q.fetch_all(pool).await?;
      decode_rows(rows)
   }

   /// Names of all tables, in SQLite's enumeration order.
   pub async fn list_tables(&self) -> Result<Vec<String>> {
      let mut conn = self.inner.read_pool()?.acquire().await?;
      introspect::list_tables(&mut conn).await
   }

   /// Describe one table; an unknown table yields an empty list.
   pub async fn describe_table(&self, table_name: &str) -> Result<Vec<CatalogObject>> {
      let mut conn = self.inner.read_pool()?.acquire().await?;
      introspect::describe_table(&mut conn, table_name).await
   }

   /// Describe every table.
   pub async fn describe_all(&self) -> Result<Vec<CatalogObject>> {
      let mut conn = self.inner.read_pool()?.acquire().await?;
      introspect::describe_all(&mut conn).await
   }

   /// Foreign keys of one table; fails with [`Error::TableNotFound`] if the
   /// table does not exist.
   pub async fn foreign_keys(&self, table_name: &str) -> Result<Vec<ResolvedForeignKey>> {
      let mut conn = self.inner.read_pool()?.acquire().await?;
      introspect::query_foreign_keys(&mut conn, table_name).await
   }

   /// Close both connections.
   pub async fn close(self) -> Result<()> {
      self.inner.close().await?;
      Ok(())
   }
}

/// Run `sql` as a script and keep the rows of its last statement.
///
/// SQLx yields a `Left(result)` each time a statement finishes, so rows seen
/// since the previous `Left` belong to the statement that just finished.
async fn execute_script(conn: &mut SqliteConnection, sql: &str) -> Result<Vec<SqliteRow>> {
   let mut stream = sqlx::raw_sql(sql).fetch_many(&mut *conn);

   let mut current = Vec::new();
   let mut last = Vec::new();

   while let Some(step) = stream.try_next().await? {
      match step {
         Either::Left(_) => last = std::mem::take(&mut current),
         Either::Right(row) => current.push(row),
      }
   }

   if !current.is_empty() {
      last = current;
   }

   Ok(last)
}

/// Commit on success, roll back on failure.
///
/// A failed COMMIT (e.g. a deferred constraint) leaves the transaction open,
/// so it is rolled back as well. If the rollback itself fails, both messages
/// are returned.
async fn finish_transaction<T>(conn: &mut SqliteConnection, result: Result<T>) -> Result<T> {
   let error = match result {
      Ok(value) => match sqlx::query("COMMIT").execute(&mut *conn).await {
         Ok(_) => {
            debug!("Transaction committed");
            return Ok(value);
         }
         Err(e) => Error::Sqlx(e),
      },
      Err(e) => e,
   };

   match sqlx::query("ROLLBACK").execute(&mut *conn).await {
      // Rollback succeeded, return original error
      Ok(_) => {
         debug!(error = %error, "Transaction rolled back");
         Err(error)
      }

      // Rollback also failed, return the rollback error and the original error
      Err(rollback_err) => Err(Error::TransactionRollbackFailed {
         transaction_error: error.to_string(),
         rollback_error: rollback_err.to_string(),
      }),
   }
}

/// Helper function to bind a JSON value to a SQLx query
pub(crate) fn bind_value<'a>(
   query: sqlx::query::Query<'a, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'a>>,
   value: JsonValue,
) -> sqlx::query::Query<'a, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'a>> {
   match value {
      JsonValue::Null => query.bind(None::<JsonValue>),
      JsonValue::Bool(b) => query.bind(b),
      JsonValue::String(s) => query.bind(s),
      JsonValue::Number(number) => {
         // Preserve integer precision by binding as i64 when possible
         if let Some(int_val) = number.as_i64() {
            query.bind(int_val)
         } else if let Some(uint_val) = number.as_u64() {
            // u64 beyond i64::MAX does not fit SQLite's INTEGER; loses precision as REAL
            query.bind(uint_val as f64)
         } else {
            query.bind(number.as_f64().unwrap_or_default())
         }
      }
      // Arrays and objects are stored as JSON text
      other => query.bind(other),
   }
}
