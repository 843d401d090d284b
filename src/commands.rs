use serde::{Deserialize, Serialize};
use sqlx_sqlite_ddl::SchemaChangeSet;
use sqlx_sqlite_toolkit::{CatalogObject, GuardedDatabase, JsonRow};
use tracing::debug;

use crate::{Error, Result};

/// One caller request, naming exactly one operation.
///
/// On the wire the operation is the `op` tag:
///
/// ```json
/// { "op": "run_ddl", "ddl": [{ "action": "drop_table", "table_name": "t" }] }
/// { "op": "write_database", "sql": "INSERT INTO t VALUES (1)" }
/// { "op": "select", "sql": "SELECT * FROM t" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
   ListTables,
   DescribeTable { table_name: String },
   DescribeDatabase,
   RunDdl { ddl: SchemaChangeSet },
   WriteDatabase { sql: String },
   Select { sql: String },
}

impl Request {
   pub fn op(&self) -> &'static str {
      match self {
         Request::ListTables => "list_tables",
         Request::DescribeTable { .. } => "describe_table",
         Request::DescribeDatabase => "describe_database",
         Request::RunDdl { .. } => "run_ddl",
         Request::WriteDatabase { .. } => "write_database",
         Request::Select { .. } => "select",
      }
   }
}

/// Structured result of a successful request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
   Tables(Vec<String>),
   Objects(Vec<CatalogObject>),
   /// Number of statements applied by `run_ddl`.
   Applied { applied: usize },
   Rows(Vec<JsonRow>),
}

/// What goes back to the caller for every request.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
   Ok { result: Response },
   Error { error: Error },
}

impl From<Result<Response>> for Reply {
   fn from(result: Result<Response>) -> Self {
      match result {
         Ok(result) => Reply::Ok { result },
         Err(error) => Reply::Error { error },
      }
   }
}

/// Decode a JSON request, rejecting unknown operations and statement actions.
pub(crate) fn parse_request(payload: &str) -> Result<Request> {
   Ok(serde_json::from_str(payload)?)
}

/// Run one request against the engine. Failures are returned as-is, never retried.
pub(crate) async fn dispatch(db: &GuardedDatabase, request: Request) -> Result<Response> {
   debug!(op = request.op(), "Dispatching request");

   let response = match request {
      Request::ListTables => Response::Tables(db.list_tables().await?),
      Request::DescribeTable { table_name } => {
         Response::Objects(db.describe_table(&table_name).await?)
      }
      Request::DescribeDatabase => Response::Objects(db.describe_all().await?),
      Request::RunDdl { ddl } => {
         db.apply_schema(&ddl).await?;
         Response::Applied {
            applied: ddl.len(),
         }
      }
      Request::WriteDatabase { sql } => Response::Rows(db.apply_modification(&sql).await?),
      Request::Select { sql } => Response::Rows(db.query(&sql).await?),
   };

   Ok(response)
}
