//! Integration tests for scoped authorizer installation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sqlx_sqlite_conn_mgr::SqliteDatabase;
use sqlx_sqlite_guard::{
   AuthAction, AuthContext, AuthDecision, AuthorizedWriteGuard, DenySchemaChanges,
};
use tempfile::TempDir;

struct TestDb {
   db: Arc<SqliteDatabase>,
   _temp_dir: TempDir,
}

async fn setup_test_db() -> TestDb {
   let _ = tracing_subscriber::fmt().with_test_writer().try_init();
   let temp_dir = TempDir::new().unwrap();
   let db = SqliteDatabase::connect(temp_dir.path().join("guard.db"), None)
      .await
      .unwrap();

   let mut writer = db.acquire_writer().await.unwrap();
   sqlx::raw_sql("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
      .execute(&mut *writer)
      .await
      .unwrap();
   drop(writer);

   TestDb {
      db,
      _temp_dir: temp_dir,
   }
}

async fn table_names(db: &SqliteDatabase) -> Vec<String> {
   sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
      .fetch_all(db.read_pool().unwrap())
      .await
      .unwrap()
}

// ============================================================================
// Denial while installed
// ============================================================================

#[tokio::test]
async fn test_schema_changes_denied_while_installed() {
   let test_db = setup_test_db().await;
   let mut writer = AuthorizedWriteGuard::acquire(&test_db.db, Arc::new(DenySchemaChanges))
      .await
      .unwrap();

   for sql in [
      "CREATE TABLE blocked (id INTEGER)",
      "CREATE TEMP TABLE blocked_tmp (id INTEGER)",
      "CREATE INDEX idx_users_name ON users (name)",
      "CREATE VIEW v AS SELECT * FROM users",
      "CREATE TRIGGER trg AFTER INSERT ON users BEGIN SELECT 1; END",
      "ALTER TABLE users RENAME TO people",
      "ALTER TABLE users ADD COLUMN age INTEGER",
      "DROP TABLE users",
   ] {
      let err = sqlx::raw_sql(sql).execute(&mut *writer).await.unwrap_err();
      assert!(
         err.to_string().contains("not authorized"),
         "{sql} should be denied, got: {err}"
      );
   }

   drop(writer);
   assert_eq!(table_names(&test_db.db).await, vec!["users"]);
}

#[tokio::test]
async fn test_data_changes_allowed_while_installed() {
   let test_db = setup_test_db().await;
   let mut writer = AuthorizedWriteGuard::acquire(&test_db.db, Arc::new(DenySchemaChanges))
      .await
      .unwrap();

   sqlx::raw_sql(
      "INSERT INTO users (name) VALUES ('Alice'); \
       UPDATE users SET name = 'Alicia' WHERE id = 1; \
       INSERT INTO users (name) VALUES ('Bob'); \
       DELETE FROM users WHERE name = 'Bob';",
   )
   .execute(&mut *writer)
   .await
   .unwrap();

   let names: Vec<String> = sqlx::query_scalar("SELECT name FROM users")
      .fetch_all(&mut *writer)
      .await
      .unwrap();
   assert_eq!(names, vec!["Alicia"]);
}

// ============================================================================
// Removal
// ============================================================================

#[tokio::test]
async fn test_release_removes_authorizer() {
   let test_db = setup_test_db().await;
   let writer = AuthorizedWriteGuard::acquire(&test_db.db, Arc::new(DenySchemaChanges))
      .await
      .unwrap();

   let mut writer = writer.release().await;
   sqlx::raw_sql("CREATE TABLE allowed (id INTEGER)")
      .execute(&mut *writer)
      .await
      .unwrap();
   drop(writer);

   assert_eq!(table_names(&test_db.db).await, vec!["allowed", "users"]);
}

#[tokio::test]
async fn test_drop_removes_authorizer_before_next_writer() {
   let test_db = setup_test_db().await;

   {
      let mut writer = AuthorizedWriteGuard::acquire(&test_db.db, Arc::new(DenySchemaChanges))
         .await
         .unwrap();
      assert!(
         sqlx::raw_sql("DROP TABLE users")
            .execute(&mut *writer)
            .await
            .is_err()
      );
   }

   // Same pooled connection, no authorizer left behind
   let mut writer = test_db.db.acquire_writer().await.unwrap();
   sqlx::raw_sql("CREATE TABLE after_drop (id INTEGER)")
      .execute(&mut *writer)
      .await
      .unwrap();
   drop(writer);

   assert_eq!(table_names(&test_db.db).await, vec!["after_drop", "users"]);
}

#[tokio::test]
async fn test_guard_dropped_mid_statement_is_cleaned_up() {
   let test_db = setup_test_db().await;

   let mut writer = AuthorizedWriteGuard::acquire(&test_db.db, Arc::new(DenySchemaChanges))
      .await
      .unwrap();

   let long_scan = "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 5000000) \
                    SELECT COUNT(*) FROM n";
   let interrupted = tokio::time::timeout(
      Duration::from_millis(10),
      sqlx::raw_sql(long_scan).execute(&mut *writer),
   )
   .await;
   assert!(interrupted.is_err());
   drop(writer);

   // The next writer waits for the interrupted statement and gets a clean connection
   let mut writer = test_db.db.acquire_writer().await.unwrap();
   sqlx::raw_sql("CREATE TABLE after_cancel (id INTEGER)")
      .execute(&mut *writer)
      .await
      .unwrap();
   drop(writer);

   assert_eq!(table_names(&test_db.db).await, vec!["after_cancel", "users"]);
}

// ============================================================================
// Custom policies
// ============================================================================

#[tokio::test]
async fn test_custom_policy_sees_actions() {
   let test_db = setup_test_db().await;
   let inserts = Arc::new(AtomicUsize::new(0));
   let counter = Arc::clone(&inserts);

   let policy = move |ctx: &AuthContext<'_>| match ctx.action {
      AuthAction::Insert => {
         counter.fetch_add(1, Ordering::SeqCst);
         assert_eq!(ctx.arg1, Some("users"));
         AuthDecision::Allow
      }
      AuthAction::Delete => AuthDecision::Deny,
      _ => AuthDecision::Allow,
   };

   let mut writer = AuthorizedWriteGuard::acquire(&test_db.db, Arc::new(policy))
      .await
      .unwrap();

   sqlx::raw_sql("INSERT INTO users (name) VALUES ('Carol')")
      .execute(&mut *writer)
      .await
      .unwrap();

   let err = sqlx::raw_sql("DELETE FROM users")
      .execute(&mut *writer)
      .await
      .unwrap_err();
   assert!(err.to_string().contains("not authorized"));

   assert_eq!(inserts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_panicking_policy_denies() {
   let test_db = setup_test_db().await;
   let policy = |ctx: &AuthContext<'_>| {
      if ctx.action == AuthAction::Insert {
         panic!("policy bug");
      }
      AuthDecision::Allow
   };

   let mut writer = AuthorizedWriteGuard::acquire(&test_db.db, Arc::new(policy))
      .await
      .unwrap();

   let err = sqlx::raw_sql("INSERT INTO users (name) VALUES ('Dave')")
      .execute(&mut *writer)
      .await
      .unwrap_err();
   assert!(err.to_string().contains("not authorized"));
}

#[tokio::test]
async fn test_installed_authorizer_is_not_visible_to_read_pool() {
   let test_db = setup_test_db().await;
   let _writer = AuthorizedWriteGuard::acquire(&test_db.db, Arc::new(|_: &AuthContext<'_>| {
      AuthDecision::Deny
   }))
   .await
   .unwrap();

   let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
      .fetch_one(test_db.db.read_pool().unwrap())
      .await
      .unwrap();
   assert_eq!(count, 0);
}
