// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys. Installing a recorder is left to the
//! embedding application.
pub const REGISTER_ACCEPTED: &str = "auth.register.accepted";
pub const REGISTER_REJECTED: &str = "auth.register.rejected";
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const PASSWORD_CHANGED: &str = "auth.password.changed";
pub const LEGACY_IMPORTED: &str = "store.legacy.imported";
