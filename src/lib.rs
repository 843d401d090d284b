//! # sqlite-gateway
//!
//! Exposes a policy-guarded SQLite file to an external caller as a small set
//! of named operations.
//!
//! A [`Gateway`] is one session: it opens the database at start, dispatches
//! each [`Request`] to exactly one engine operation, and closes the database
//! at the end. Schema changes arrive as typed statements (`run_ddl`), data
//! changes as raw SQL run with schema changes denied (`write_database`), and
//! reads as raw SQL on a read-only connection (`select`).
//!
//! ```no_run
//! use sqlite_gateway::Gateway;
//!
//! # async fn example() -> sqlite_gateway::Result<()> {
//! let gateway = Gateway::open("app.db", None).await?;
//!
//! let reply = gateway
//!    .handle_json(r#"{ "op": "select", "sql": "SELECT name FROM sqlite_master" }"#)
//!    .await;
//! println!("{}", serde_json::to_string(&reply).unwrap_or_default());
//!
//! gateway.close().await?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use tracing::debug;

mod commands;
mod error;

pub use commands::{Reply, Request, Response};
pub use error::{Error, Result};
pub use sqlx_sqlite_conn_mgr::SqliteDatabaseConfig;
pub use sqlx_sqlite_ddl as ddl;
pub use sqlx_sqlite_toolkit::{CatalogObject, GuardedDatabase, JsonRow, ResolvedForeignKey};

/// One caller session over one database file.
pub struct Gateway {
   db: GuardedDatabase,
}

impl Gateway {
   /// Open the database at `path` for the lifetime of this session.
   pub async fn open(path: impl AsRef<Path>, config: Option<SqliteDatabaseConfig>) -> Result<Self> {
      let path = path.as_ref();
      let db = GuardedDatabase::connect(path, config).await?;
      debug!(path = %path.display(), "Gateway session opened");
      Ok(Self { db })
   }

   /// The engine behind this session.
   pub fn database(&self) -> &GuardedDatabase {
      &self.db
   }

   /// Run one typed request.
   pub async fn handle(&self, request: Request) -> Result<Response> {
      commands::dispatch(&self.db, request).await
   }

   /// Decode a JSON request, run it, and build the reply.
   ///
   /// Payloads that do not decode are answered with an `INVALID_REQUEST`
   /// error without touching the database.
   pub async fn handle_json(&self, payload: &str) -> Reply {
      let result = match commands::parse_request(payload) {
         Ok(request) => self.handle(request).await,
         Err(e) => Err(e),
      };
      Reply::from(result)
   }

   /// End the session and close both connections.
   pub async fn close(self) -> Result<()> {
      self.db.close().await?;
      debug!("Gateway session closed");
      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use serde_json::json;
   use sqlx_sqlite_ddl::{Column, CreateTable, SchemaChangeSet};
   use tempfile::TempDir;

   use super::*;

   async fn open_gateway() -> (Gateway, TempDir) {
      let temp_dir = TempDir::new().expect("Failed to create temp directory");
      let gateway = Gateway::open(temp_dir.path().join("gateway.db"), None)
         .await
         .expect("Failed to open gateway");
      (gateway, temp_dir)
   }

   async fn reply_json(gateway: &Gateway, payload: serde_json::Value) -> serde_json::Value {
      let reply = gateway.handle_json(&payload.to_string()).await;
      serde_json::to_value(&reply).unwrap()
   }

   #[tokio::test]
   async fn test_session_round_trip() {
      let (gateway, _temp) = open_gateway().await;

      let reply = reply_json(
         &gateway,
         json!({
            "op": "run_ddl",
            "ddl": [{
               "action": "create_table",
               "table_name": "items",
               "columns": [
                  { "name": "id", "data_type": "INTEGER", "primary_key": true },
                  { "name": "label", "data_type": "TEXT", "not_null": true }
               ]
            }]
         }),
      )
      .await;
      assert_eq!(reply, json!({ "status": "ok", "result": { "applied": 1 } }));

      let reply = reply_json(
         &gateway,
         json!({
            "op": "write_database",
            "sql": "INSERT INTO items (id, label) VALUES (1, 'first') RETURNING id"
         }),
      )
      .await;
      assert_eq!(reply, json!({ "status": "ok", "result": [{ "id": 1 }] }));

      let reply = reply_json(
         &gateway,
         json!({ "op": "select", "sql": "SELECT label FROM items" }),
      )
      .await;
      assert_eq!(reply, json!({ "status": "ok", "result": [{ "label": "first" }] }));

      let reply = reply_json(&gateway, json!({ "op": "list_tables" })).await;
      assert_eq!(reply, json!({ "status": "ok", "result": ["items"] }));

      let reply = reply_json(&gateway, json!({ "op": "describe_database" })).await;
      assert_eq!(reply["result"][0]["name"], "items");
      assert_eq!(reply["result"][0]["type"], "table");

      gateway.close().await.unwrap();
   }

   #[tokio::test]
   async fn test_policy_violation_reported_with_engine_code() {
      let (gateway, _temp) = open_gateway().await;

      let reply = reply_json(
         &gateway,
         json!({ "op": "write_database", "sql": "CREATE TABLE sneaky (id INTEGER)" }),
      )
      .await;
      assert_eq!(reply["status"], "error");
      assert_eq!(reply["error"]["code"], "SQLITE_23");
      assert!(
         reply["error"]["message"]
            .as_str()
            .unwrap()
            .contains("not authorized")
      );

      let tables = gateway.handle(Request::ListTables).await.unwrap();
      assert!(matches!(tables, Response::Tables(t) if t.is_empty()));
   }

   #[tokio::test]
   async fn test_invalid_request_does_not_reach_engine() {
      let (gateway, _temp) = open_gateway().await;

      let reply = reply_json(
         &gateway,
         json!({
            "op": "run_ddl",
            "ddl": [
               { "action": "create_table", "table_name": "ok", "columns": [{ "name": "id", "data_type": "INTEGER" }] },
               { "action": "truncate_table", "table_name": "ok" }
            ]
         }),
      )
      .await;
      assert_eq!(reply["error"]["code"], "INVALID_REQUEST");

      let tables = gateway.database().list_tables().await.unwrap();
      assert!(tables.is_empty());
   }

   #[tokio::test]
   async fn test_typed_request_and_missing_table() {
      let (gateway, _temp) = open_gateway().await;

      let mut ddl = SchemaChangeSet::new();
      ddl.push(CreateTable::new("notes").with_column(Column::new("id", "INTEGER").primary_key()));
      let response = gateway.handle(Request::RunDdl { ddl }).await.unwrap();
      assert!(matches!(response, Response::Applied { applied: 1 }));

      let response = gateway
         .handle(Request::DescribeTable {
            table_name: "missing".into(),
         })
         .await
         .unwrap();
      assert!(matches!(response, Response::Objects(o) if o.is_empty()));
   }
}
