use async_trait::async_trait;
use lexvault_core::{AppResult, UserId};

/// Read-only projection of a user record from the identity subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    /// Stable user identifier.
    pub id: UserId,
    /// Display name.
    pub display_name: String,
    /// Email, if the identity subsystem recorded one.
    pub email: Option<String>,
}

/// Lookup port into the external identity subsystem.
///
/// The access-control core never creates or mutates users; it only verifies
/// that a referenced identifier resolves to an existing record.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user by identifier.
    async fn find_user_by_id(&self, user_id: UserId) -> AppResult<Option<UserSummary>>;
}
