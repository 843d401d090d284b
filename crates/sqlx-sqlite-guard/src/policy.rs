//! Authorization policies consulted by the installed hook.

use std::os::raw::c_int;

use libsqlite3_sys as ffi;
use tracing::debug;

use crate::action::AuthAction;

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
   /// Let the operation compile.
   Allow,
   /// Fail statement compilation with `SQLITE_AUTH` ("not authorized").
   Deny,
   /// Compile, but read NULL instead of the column (reads) or skip the operation.
   Ignore,
}

impl AuthDecision {
   pub(crate) fn as_code(self) -> c_int {
      match self {
         AuthDecision::Allow => ffi::SQLITE_OK,
         AuthDecision::Deny => ffi::SQLITE_DENY,
         AuthDecision::Ignore => ffi::SQLITE_IGNORE,
      }
   }
}

/// Arguments of one authorizer callback.
///
/// `arg1`/`arg2` depend on the action: table and column names for reads and
/// updates, index and table names for index DDL, and so on.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext<'a> {
   pub action: AuthAction,
   pub arg1: Option<&'a str>,
   pub arg2: Option<&'a str>,
   /// Database name (`main`, `temp`, or an attached name).
   pub database: Option<&'a str>,
   /// Innermost trigger or view responsible for the access, if any.
   pub trigger_or_view: Option<&'a str>,
}

/// Decides, per compiled operation, whether it may run.
///
/// Called from the thread that runs the connection, during statement
/// preparation. Implementations must not panic; a panic is caught and
/// treated as [`AuthDecision::Deny`].
pub trait AuthorizationPolicy: Send + Sync + 'static {
   fn authorize(&self, ctx: &AuthContext<'_>) -> AuthDecision;
}

impl<F> AuthorizationPolicy for F
where
   F: Fn(&AuthContext<'_>) -> AuthDecision + Send + Sync + 'static,
{
   fn authorize(&self, ctx: &AuthContext<'_>) -> AuthDecision {
      self(ctx)
   }
}

/// Denies every schema-altering action and allows everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenySchemaChanges;

impl AuthorizationPolicy for DenySchemaChanges {
   fn authorize(&self, ctx: &AuthContext<'_>) -> AuthDecision {
      if ctx.action.is_schema_change() {
         debug!(action = ?ctx.action, object = ?ctx.arg1, "Denied schema change");
         return AuthDecision::Deny;
      }
      AuthDecision::Allow
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn ctx(action: AuthAction) -> AuthContext<'static> {
      AuthContext {
         action,
         arg1: Some("users"),
         arg2: None,
         database: Some("main"),
         trigger_or_view: None,
      }
   }

   #[test]
   fn test_deny_schema_changes() {
      let policy = DenySchemaChanges;
      assert_eq!(policy.authorize(&ctx(AuthAction::DropTable)), AuthDecision::Deny);
      assert_eq!(policy.authorize(&ctx(AuthAction::CreateTempTrigger)), AuthDecision::Deny);
      assert_eq!(policy.authorize(&ctx(AuthAction::Insert)), AuthDecision::Allow);
      assert_eq!(policy.authorize(&ctx(AuthAction::Transaction)), AuthDecision::Allow);
   }

   #[test]
   fn test_closure_policy() {
      let policy = |c: &AuthContext<'_>| {
         if c.action == AuthAction::Delete {
            AuthDecision::Deny
         } else {
            AuthDecision::Allow
         }
      };
      assert_eq!(policy.authorize(&ctx(AuthAction::Delete)), AuthDecision::Deny);
      assert_eq!(policy.authorize(&ctx(AuthAction::Update)), AuthDecision::Allow);
   }

   #[test]
   fn test_decision_codes() {
      assert_eq!(AuthDecision::Allow.as_code(), ffi::SQLITE_OK);
      assert_eq!(AuthDecision::Deny.as_code(), ffi::SQLITE_DENY);
      assert_eq!(AuthDecision::Ignore.as_code(), ffi::SQLITE_IGNORE);
   }
}
