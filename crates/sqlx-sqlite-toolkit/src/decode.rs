//! Decoding SQLite values into JSON.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteRow, SqliteValueRef};
use sqlx::{Column, Decode, Row, Sqlite, TypeInfo, ValueRef};

use crate::{Error, Result};

/// One result row, keyed by column name in select-list order.
pub type JsonRow = IndexMap<String, JsonValue>;

/// Convert a single SQLite value into JSON by its storage class.
///
/// BLOBs become base64 strings; non-finite REALs become `null`.
pub(crate) fn to_json(v: SqliteValueRef<'_>) -> Result<JsonValue> {
   if v.is_null() {
      return Ok(JsonValue::Null);
   }

   let type_name = v.type_info().name().to_string();
   let value = match type_name.as_str() {
      "INTEGER" | "BOOLEAN" => JsonValue::from(decode::<i64>(v)?),
      "REAL" | "NUMERIC" => serde_json::Number::from_f64(decode::<f64>(v)?)
         .map(JsonValue::Number)
         .unwrap_or(JsonValue::Null),
      "TEXT" | "DATE" | "TIME" | "DATETIME" => JsonValue::String(decode::<String>(v)?),
      "BLOB" => JsonValue::String(STANDARD.encode(decode::<Vec<u8>>(v)?)),
      "NULL" => JsonValue::Null,
      other => return Err(Error::UnsupportedDatatype(other.to_string())),
   };

   Ok(value)
}

fn decode<'r, T: Decode<'r, Sqlite>>(v: SqliteValueRef<'r>) -> Result<T> {
   T::decode(v).map_err(|e| Error::Sqlx(sqlx::Error::Decode(e)))
}

/// Decode every row into a column-name-to-value map.
pub(crate) fn decode_rows(rows: Vec<SqliteRow>) -> Result<Vec<JsonRow>> {
   let mut values = Vec::with_capacity(rows.len());
   for row in rows {
      let mut value = IndexMap::default();
      for (i, column) in row.columns().iter().enumerate() {
         let v = row.try_get_raw(i)?;
         value.insert(column.name().to_string(), to_json(v)?);
      }
      values.push(value);
   }
   Ok(values)
}
