//! Session conventions for the authenticated request context.
//!
//! Credential verification lives in the identity subsystem; it writes the
//! [`lexvault_core::UserIdentity`] into the session under this key and this
//! API only reads it back.

/// Session key holding the authenticated [`lexvault_core::UserIdentity`].
pub const SESSION_USER_KEY: &str = "user_identity";
