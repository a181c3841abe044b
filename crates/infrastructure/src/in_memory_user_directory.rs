use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use lexvault_application::{UserDirectory, UserSummary};
use lexvault_core::{AppResult, UserId};

/// In-memory user directory used by tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserSummary>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty in-memory directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a user record.
    pub async fn insert_user(&self, user: UserSummary) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user_by_id(&self, user_id: UserId) -> AppResult<Option<UserSummary>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use lexvault_application::{UserDirectory, UserSummary};
    use lexvault_core::UserId;

    use super::InMemoryUserDirectory;

    #[tokio::test]
    async fn finds_registered_user() {
        let directory = InMemoryUserDirectory::new();
        let user_id = UserId::new();
        directory
            .insert_user(UserSummary {
                id: user_id,
                display_name: "Dana Reyes".to_owned(),
                email: Some("dana@lexvault.test".to_owned()),
            })
            .await;

        let found = directory.find_user_by_id(user_id).await;
        assert_eq!(
            found.ok().flatten().map(|user| user.display_name),
            Some("Dana Reyes".to_owned())
        );

        let missing = directory.find_user_by_id(UserId::new()).await;
        assert_eq!(missing.ok().flatten(), None);
    }
}
