//! Raw `sqlite3_set_authorizer` registration.
//!
//! The policy is boxed and handed to SQLite as the callback's user data. It
//! stays alive until [`unregister_authorizer`] detaches the callback and
//! reclaims the box.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::Arc;

use libsqlite3_sys::{self as ffi, sqlite3};
use tracing::{trace, warn};

use crate::action::AuthAction;
use crate::error::{Error, Result};
use crate::policy::{AuthContext, AuthorizationPolicy};

type SharedPolicy = Arc<dyn AuthorizationPolicy>;

/// Install `policy` as the authorizer of `db`.
///
/// Returns the user-data pointer that must later be passed to
/// [`unregister_authorizer`].
///
/// # Safety
///
/// `db` must be a valid, open connection that no other thread is using for
/// the duration of the call.
pub(crate) unsafe fn register_authorizer(
   db: *mut sqlite3,
   policy: SharedPolicy,
) -> Result<*mut c_void> {
   let user_data = Box::into_raw(Box::new(policy)) as *mut c_void;

   let rc = unsafe { ffi::sqlite3_set_authorizer(db, Some(authorizer_callback), user_data) };

   if rc != ffi::SQLITE_OK {
      // SAFETY: SQLite did not take ownership; reclaim the box we just leaked.
      drop(unsafe { Box::from_raw(user_data as *mut SharedPolicy) });
      return Err(Error::HookRegistration(format!(
         "sqlite3_set_authorizer returned {rc}"
      )));
   }

   trace!("Authorizer registered");
   Ok(user_data)
}

/// Detach the authorizer from `db` and free the policy registered with it.
///
/// # Safety
///
/// `db` must be the connection `user_data` was registered on, and
/// `user_data` must come from [`register_authorizer`] and not have been
/// unregistered already.
pub(crate) unsafe fn unregister_authorizer(db: *mut sqlite3, user_data: *mut c_void) {
   let rc = unsafe { ffi::sqlite3_set_authorizer(db, None, ptr::null_mut()) };
   if rc != ffi::SQLITE_OK {
      warn!(rc, "sqlite3_set_authorizer failed while clearing the authorizer");
   }

   // SAFETY: the callback is detached, so SQLite no longer references user_data.
   drop(unsafe { Box::from_raw(user_data as *mut SharedPolicy) });
   trace!("Authorizer unregistered");
}

unsafe extern "C" fn authorizer_callback(
   user_data: *mut c_void,
   code: c_int,
   arg1: *const c_char,
   arg2: *const c_char,
   database: *const c_char,
   trigger_or_view: *const c_char,
) -> c_int {
   let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
      // SAFETY: user_data is the boxed policy installed by register_authorizer
      // and outlives the registration.
      let policy = unsafe { &*(user_data as *const SharedPolicy) };

      let ctx = AuthContext {
         action: AuthAction::from_code(code),
         arg1: unsafe { opt_str(arg1) },
         arg2: unsafe { opt_str(arg2) },
         database: unsafe { opt_str(database) },
         trigger_or_view: unsafe { opt_str(trigger_or_view) },
      };

      policy.authorize(&ctx).as_code()
   }));

   outcome.unwrap_or(ffi::SQLITE_DENY)
}

/// Borrow a nullable C string for the duration of the callback.
unsafe fn opt_str<'a>(p: *const c_char) -> Option<&'a str> {
   if p.is_null() {
      return None;
   }
   unsafe { CStr::from_ptr(p) }.to_str().ok()
}
