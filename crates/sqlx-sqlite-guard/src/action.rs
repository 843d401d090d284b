//! SQLite authorizer action codes.

use std::os::raw::c_int;

use libsqlite3_sys as ffi;

/// Operation SQLite asks the authorizer about while compiling a statement.
///
/// Mirrors the action codes passed to `sqlite3_set_authorizer` callbacks.
/// Codes this enum does not know about are kept as [`AuthAction::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthAction {
   CreateIndex,
   CreateTable,
   CreateTempIndex,
   CreateTempTable,
   CreateTempTrigger,
   CreateTempView,
   CreateTrigger,
   CreateView,
   Delete,
   DropIndex,
   DropTable,
   DropTempIndex,
   DropTempTable,
   DropTempTrigger,
   DropTempView,
   DropTrigger,
   DropView,
   Insert,
   Pragma,
   Read,
   Select,
   Transaction,
   Update,
   Attach,
   Detach,
   AlterTable,
   Reindex,
   Analyze,
   CreateVtable,
   DropVtable,
   Function,
   Savepoint,
   Recursive,
   Other(c_int),
}

impl AuthAction {
   pub fn from_code(code: c_int) -> Self {
      match code {
         ffi::SQLITE_CREATE_INDEX => Self::CreateIndex,
         ffi::SQLITE_CREATE_TABLE => Self::CreateTable,
         ffi::SQLITE_CREATE_TEMP_INDEX => Self::CreateTempIndex,
         ffi::SQLITE_CREATE_TEMP_TABLE => Self::CreateTempTable,
         ffi::SQLITE_CREATE_TEMP_TRIGGER => Self::CreateTempTrigger,
         ffi::SQLITE_CREATE_TEMP_VIEW => Self::CreateTempView,
         ffi::SQLITE_CREATE_TRIGGER => Self::CreateTrigger,
         ffi::SQLITE_CREATE_VIEW => Self::CreateView,
         ffi::SQLITE_DELETE => Self::Delete,
         ffi::SQLITE_DROP_INDEX => Self::DropIndex,
         ffi::SQLITE_DROP_TABLE => Self::DropTable,
         ffi::SQLITE_DROP_TEMP_INDEX => Self::DropTempIndex,
         ffi::SQLITE_DROP_TEMP_TABLE => Self::DropTempTable,
         ffi::SQLITE_DROP_TEMP_TRIGGER => Self::DropTempTrigger,
         ffi::SQLITE_DROP_TEMP_VIEW => Self::DropTempView,
         ffi::SQLITE_DROP_TRIGGER => Self::DropTrigger,
         ffi::SQLITE_DROP_VIEW => Self::DropView,
         ffi::SQLITE_INSERT => Self::Insert,
         ffi::SQLITE_PRAGMA => Self::Pragma,
         ffi::SQLITE_READ => Self::Read,
         ffi::SQLITE_SELECT => Self::Select,
         ffi::SQLITE_TRANSACTION => Self::Transaction,
         ffi::SQLITE_UPDATE => Self::Update,
         ffi::SQLITE_ATTACH => Self::Attach,
         ffi::SQLITE_DETACH => Self::Detach,
         ffi::SQLITE_ALTER_TABLE => Self::AlterTable,
         ffi::SQLITE_REINDEX => Self::Reindex,
         ffi::SQLITE_ANALYZE => Self::Analyze,
         ffi::SQLITE_CREATE_VTABLE => Self::CreateVtable,
         ffi::SQLITE_DROP_VTABLE => Self::DropVtable,
         ffi::SQLITE_FUNCTION => Self::Function,
         ffi::SQLITE_SAVEPOINT => Self::Savepoint,
         ffi::SQLITE_RECURSIVE => Self::Recursive,
         other => Self::Other(other),
      }
   }

   /// Whether this action creates, drops or alters a schema object
   /// (table, index, trigger, view or virtual table, temp variants included).
   pub fn is_schema_change(self) -> bool {
      matches!(
         self,
         Self::CreateIndex
            | Self::CreateTable
            | Self::CreateTempIndex
            | Self::CreateTempTable
            | Self::CreateTempTrigger
            | Self::CreateTempView
            | Self::CreateTrigger
            | Self::CreateView
            | Self::DropIndex
            | Self::DropTable
            | Self::DropTempIndex
            | Self::DropTempTable
            | Self::DropTempTrigger
            | Self::DropTempView
            | Self::DropTrigger
            | Self::DropView
            | Self::AlterTable
            | Self::CreateVtable
            | Self::DropVtable
      )
   }
}
