//! Scoped authorizer installation on the write connection.

use std::ops::{Deref, DerefMut};
use std::os::raw::c_void;
use std::ptr;
use std::sync::Arc;

use libsqlite3_sys::sqlite3;
use sqlx::sqlite::SqliteConnection;
use sqlx_sqlite_conn_mgr::{SqliteDatabase, WriteGuard};
use tracing::{debug, trace, warn};

use crate::Result;
use crate::hooks;
use crate::policy::AuthorizationPolicy;

/// RAII guard for write access with an authorizer installed.
///
/// Wraps a `WriteGuard` from `sqlx-sqlite-conn-mgr`. While this guard is
/// alive, every statement compiled on the connection is checked by the
/// policy. The authorizer is removed by [`release`](Self::release).
///
/// If the guard is dropped instead (a cancelled future, a panic), the worker
/// thread may still be stepping a statement. Inside a Tokio runtime the
/// removal is then handed to a task that waits for the connection handle
/// lock, and the write connection only returns to its pool after that task
/// has removed the authorizer, so the next writer never sees it. Without a
/// runtime the authorizer is removed directly.
#[must_use = "if unused, the write lock is immediately released"]
pub struct AuthorizedWriteGuard {
   writer: Option<WriteGuard>,
   /// Raw sqlite3 pointer, cached so Drop can remove the authorizer
   /// synchronously without the async lock_handle.
   raw_db: *mut sqlite3,
   /// Policy registered with SQLite; null once the authorizer is removed.
   user_data: *mut c_void,
   /// Whether `Drop` may hand removal to a runtime task.
   defer_on_drop: bool,
}

// SAFETY: The raw pointers are only used to register and remove the
// authorizer and are always accessed from the same logical owner. The
// underlying sqlite3 connection is already Send via sqlx's PoolConnection.
unsafe impl Send for AuthorizedWriteGuard {}

impl AuthorizedWriteGuard {
   /// Acquire the writer of `db` and install `policy` on it.
   pub async fn acquire(
      db: &SqliteDatabase,
      policy: Arc<dyn AuthorizationPolicy>,
   ) -> Result<Self> {
      let writer = db.acquire_writer().await?;
      Self::install(writer, policy).await
   }

   /// Install `policy` on an already acquired writer.
   pub async fn install(
      mut writer: WriteGuard,
      policy: Arc<dyn AuthorizationPolicy>,
   ) -> Result<Self> {
      let (raw_db, user_data) = {
         let mut handle = writer.lock_handle().await?;
         let db: *mut sqlite3 = handle.as_raw_handle().as_ptr();

         // SAFETY: the handle lock guarantees the worker is not using db.
         let user_data = unsafe { hooks::register_authorizer(db, policy)? };
         (db, user_data)
      };

      debug!("Authorizer installed on write connection");

      Ok(Self {
         writer: Some(writer),
         raw_db,
         user_data,
         defer_on_drop: true,
      })
   }

   /// Remove the authorizer and hand back the plain write guard.
   pub async fn release(mut self) -> WriteGuard {
      let mut writer = self.writer.take().expect("writer already taken");

      if !self.user_data.is_null() {
         match writer.lock_handle().await {
            Ok(mut handle) => {
               let user_data = std::mem::replace(&mut self.user_data, ptr::null_mut());
               // SAFETY: user_data was registered on this connection and the
               // handle lock keeps the worker idle.
               unsafe { hooks::unregister_authorizer(handle.as_raw_handle().as_ptr(), user_data) };
            }
            Err(e) => {
               warn!(error = %e, "Failed to lock connection handle; removing authorizer without it");
               let user_data = std::mem::replace(&mut self.user_data, ptr::null_mut());
               // SAFETY: raw_db stays valid while we own the writer.
               unsafe { hooks::unregister_authorizer(self.raw_db, user_data) };
            }
         }
         debug!("Authorizer removed from write connection");
      }

      writer
   }

   fn writer_mut(&mut self) -> &mut WriteGuard {
      self.writer.as_mut().expect("writer already taken")
   }
}

impl Drop for AuthorizedWriteGuard {
   fn drop(&mut self) {
      if self.user_data.is_null() || self.writer.is_none() {
         return;
      }

      if self.defer_on_drop
         && let Ok(runtime) = tokio::runtime::Handle::try_current()
      {
         // If the task never runs, this guard's own Drop removes the
         // authorizer directly.
         let pending = Self {
            writer: self.writer.take(),
            raw_db: self.raw_db,
            user_data: std::mem::replace(&mut self.user_data, ptr::null_mut()),
            defer_on_drop: false,
         };
         runtime.spawn(async move {
            drop(pending.release().await);
         });
         trace!("AuthorizedWriteGuard dropped, authorizer removal deferred until the connection is idle");
         return;
      }

      // SAFETY: raw_db was obtained from lock_handle during install and
      // remains valid because we still own the WriteGuard.
      unsafe {
         hooks::unregister_authorizer(self.raw_db, self.user_data);
      }
      self.user_data = ptr::null_mut();
      trace!("AuthorizedWriteGuard dropped, authorizer removed");
   }
}

impl Deref for AuthorizedWriteGuard {
   type Target = SqliteConnection;

   fn deref(&self) -> &Self::Target {
      self.writer.as_ref().expect("writer already taken")
   }
}

impl DerefMut for AuthorizedWriteGuard {
   fn deref_mut(&mut self) -> &mut Self::Target {
      self.writer_mut()
   }
}
