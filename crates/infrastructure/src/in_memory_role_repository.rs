use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use lexvault_application::{NewRole, RoleRepository, RoleUpdate};
use lexvault_core::{AppError, AppResult};
use lexvault_domain::{Role, RoleId};

/// In-memory role repository used by tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<HashMap<RoleId, Role>>,
}

impl InMemoryRoleRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn create(&self, new_role: NewRole) -> AppResult<Role> {
        let mut roles = self.roles.write().await;

        if roles
            .values()
            .any(|role| role.name().as_str() == new_role.name.as_str())
        {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                new_role.name
            )));
        }

        let now = Utc::now();
        let role = Role::new(
            RoleId::new(),
            new_role.name,
            new_role.description,
            new_role.permissions,
            new_role.is_system_role,
            now,
            now,
        );
        roles.insert(role.id(), role.clone());
        Ok(role)
    }

    async fn find_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&role_id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .values()
            .find(|role| role.name().as_str() == name)
            .cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<Role>> {
        let mut listed: Vec<Role> = self.roles.read().await.values().cloned().collect();
        listed.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
        Ok(listed)
    }

    async fn update(&self, role_id: RoleId, update: RoleUpdate) -> AppResult<Role> {
        let mut roles = self.roles.write().await;

        if let Some(new_name) = &update.name
            && roles
                .iter()
                .any(|(id, role)| *id != role_id && role.name().as_str() == new_name.as_str())
        {
            return Err(AppError::Conflict(format!(
                "role '{new_name}' already exists"
            )));
        }

        let stored = roles
            .get_mut(&role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        let updated = Role::new(
            stored.id(),
            update.name.unwrap_or_else(|| stored.name().clone()),
            update
                .description
                .or_else(|| stored.description().map(str::to_owned)),
            update
                .permissions
                .unwrap_or_else(|| stored.permissions().clone()),
            stored.is_system_role(),
            stored.created_at(),
            Utc::now(),
        );
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, role_id: RoleId) -> AppResult<()> {
        self.roles
            .write()
            .await
            .remove(&role_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }
}

#[cfg(test)]
mod tests {
    use lexvault_application::{NewRole, RoleRepository, RoleUpdate};
    use lexvault_core::{AppError, NonEmptyString};
    use lexvault_domain::{Action, PermissionSet, Resource, RoleId};

    use super::InMemoryRoleRepository;

    fn new_role(name: &str) -> NewRole {
        let mut permissions = PermissionSet::new();
        permissions.grant(Resource::Documents, Action::Read);

        NewRole {
            name: NonEmptyString::new(name).unwrap_or_else(|_| {
                unreachable!("test role names are non-empty")
            }),
            description: None,
            permissions,
            is_system_role: false,
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name() {
        let repository = InMemoryRoleRepository::new();

        let first = repository.create(new_role("Counsel")).await;
        assert!(first.is_ok());

        let second = repository.create(new_role("Counsel")).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn list_is_ordered_by_name() {
        let repository = InMemoryRoleRepository::new();
        for name in ["Paralegal", "Counsel", "Archivist"] {
            let created = repository.create(new_role(name)).await;
            assert!(created.is_ok());
        }

        let names: Vec<String> = repository
            .list_all()
            .await
            .map(|roles| {
                roles
                    .iter()
                    .map(|role| role.name().as_str().to_owned())
                    .collect()
            })
            .unwrap_or_default();
        assert_eq!(names, vec!["Archivist", "Counsel", "Paralegal"]);
    }

    #[tokio::test]
    async fn update_rejects_rename_onto_taken_name() {
        let repository = InMemoryRoleRepository::new();
        let Ok(_) = repository.create(new_role("Counsel")).await else {
            panic!("role creation failed");
        };
        let Ok(paralegal) = repository.create(new_role("Paralegal")).await else {
            panic!("role creation failed");
        };

        let result = repository
            .update(
                paralegal.id(),
                RoleUpdate {
                    name: NonEmptyString::new("Counsel").ok(),
                    ..RoleUpdate::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn delete_missing_role_is_not_found() {
        let repository = InMemoryRoleRepository::new();
        let result = repository.delete(RoleId::new()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
