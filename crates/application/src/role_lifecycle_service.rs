use std::sync::Arc;

use chrono::{DateTime, Utc};
use lexvault_core::{AppError, AppResult, NonEmptyString, UserId};
use lexvault_domain::{PermissionSet, Role, RoleId};

use crate::access_ports::{
    AssignmentRepository, NewRole, RoleRepository, RoleUpdate, UserDirectory,
};

mod assignments;

/// Input payload for creating roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Globally unique role name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Grants to attach to the role.
    pub permissions: PermissionSet,
    /// Marks the role as system-managed. Only seeding sets this.
    pub is_system_role: bool,
}

/// Input payload for partial role updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement permission structure.
    pub permissions: Option<PermissionSet>,
}

/// Input payload for assigning a role to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRoleInput {
    /// User receiving the role.
    pub user_id: UserId,
    /// Role being granted.
    pub role_id: RoleId,
    /// User performing the grant, if recorded.
    pub assigned_by: Option<UserId>,
    /// Optional expiry for the grant.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Application service enforcing the business rules around role and
/// assignment mutation.
///
/// System roles cannot be renamed or deleted, roles with effective
/// assignments cannot be deleted, and a user-role pair never grows a second
/// row: re-granting a revoked role reactivates the retained row instead.
#[derive(Clone)]
pub struct RoleLifecycleService {
    role_repository: Arc<dyn RoleRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    user_directory: Arc<dyn UserDirectory>,
}

impl RoleLifecycleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        role_repository: Arc<dyn RoleRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        user_directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            role_repository,
            assignment_repository,
            user_directory,
        }
    }

    /// Creates a custom role after checking name uniqueness.
    ///
    /// The store's unique constraint remains the authority under concurrent
    /// creates; the pre-check only produces a friendlier error for the
    /// common sequential case.
    pub async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let name = NonEmptyString::new(input.name)?;

        if self
            .role_repository
            .find_by_name(name.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "role '{name}' already exists"
            )));
        }

        self.role_repository
            .create(NewRole {
                name,
                description: input.description,
                permissions: input.permissions,
                is_system_role: input.is_system_role,
            })
            .await
    }

    /// Returns a role by identifier.
    pub async fn get_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.role_repository
            .find_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    /// Returns a role by exact name.
    pub async fn get_role_by_name(&self, name: &str) -> AppResult<Role> {
        self.role_repository
            .find_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{name}' was not found")))
    }

    /// Lists every role, ordered by name.
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.role_repository.list_all().await
    }

    /// Applies a partial update to a role.
    pub async fn update_role(&self, role_id: RoleId, input: UpdateRoleInput) -> AppResult<Role> {
        let update = RoleUpdate {
            name: input.name.map(NonEmptyString::new).transpose()?,
            description: input.description,
            permissions: input.permissions,
        };

        if update.is_empty() {
            return Err(AppError::Validation(
                "update must change at least one field".to_owned(),
            ));
        }

        let role = self.get_role(role_id).await?;

        if let Some(new_name) = &update.name {
            if role.is_system_role() {
                return Err(AppError::SystemRoleProtected(format!(
                    "system role '{}' cannot be renamed",
                    role.name()
                )));
            }

            if new_name.as_str() != role.name().as_str()
                && self
                    .role_repository
                    .find_by_name(new_name.as_str())
                    .await?
                    .is_some()
            {
                return Err(AppError::Conflict(format!(
                    "role '{new_name}' already exists"
                )));
            }
        }

        self.role_repository.update(role_id, update).await
    }

    /// Hard-deletes a role that is neither system-managed nor in use.
    ///
    /// Inactive or expired assignments do not block deletion; only rows
    /// satisfying the effectiveness predicate count.
    pub async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let role = self.get_role(role_id).await?;

        if role.is_system_role() {
            return Err(AppError::SystemRoleProtected(format!(
                "system role '{}' cannot be deleted",
                role.name()
            )));
        }

        let effective_count = self
            .assignment_repository
            .count_effective_for_role(role_id)
            .await?;

        if effective_count > 0 {
            return Err(AppError::RoleInUse(format!(
                "role '{}' still has {effective_count} active assignment(s)",
                role.name()
            )));
        }

        self.role_repository.delete(role_id).await
    }
}
