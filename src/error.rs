use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Caller-facing errors.
///
/// Serializes as `{ "code": ..., "message": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from the guarded engine, passed through unchanged.
   #[error(transparent)]
   Toolkit(#[from] sqlx_sqlite_toolkit::Error),

   /// The request could not be decoded (malformed JSON, unknown operation or
   /// unknown statement action). The engine was not touched.
   #[error("invalid request: {0}")]
   InvalidRequest(String),
}

impl Error {
   /// Machine-readable error code.
   pub fn error_code(&self) -> String {
      match self {
         Error::Toolkit(e) => e.error_code(),
         Error::InvalidRequest(_) => "INVALID_REQUEST".to_string(),
      }
   }

   /// Whether the engine refused a schema change on the modification path.
   pub fn is_policy_violation(&self) -> bool {
      matches!(self, Error::Toolkit(e) if e.is_policy_violation())
   }
}

impl From<serde_json::Error> for Error {
   fn from(err: serde_json::Error) -> Self {
      Error::InvalidRequest(err.to_string())
   }
}

impl Serialize for Error {
   fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
      let mut state = serializer.serialize_struct("Error", 2)?;
      state.serialize_field("code", &self.error_code())?;
      state.serialize_field("message", &self.to_string())?;
      state.end()
   }
}
