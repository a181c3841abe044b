use super::*;

use lexvault_domain::RoleAssignment;

use crate::access_ports::{
    AssignmentUpdate, AssignmentWithRole, AssignmentWithUser, NewAssignment,
};

impl RoleLifecycleService {
    /// Grants a role to a user.
    ///
    /// Re-granting a soft-removed role reactivates the retained row (same
    /// id) and applies the newly requested expiry; re-granting a currently
    /// active role fails with a conflict. A uniqueness violation raced from
    /// the store is resolved by re-reading the winning row and applying the
    /// same policy.
    pub async fn assign_role(&self, input: AssignRoleInput) -> AppResult<RoleAssignment> {
        self.require_user(input.user_id, "user").await?;
        self.get_role(input.role_id).await?;
        if let Some(assigner) = input.assigned_by {
            self.require_user(assigner, "assigning user").await?;
        }

        match self
            .assignment_repository
            .find_by_user_and_role(input.user_id, input.role_id)
            .await?
        {
            Some(existing) => self.reactivate_or_reject(existing, &input).await,
            None => {
                let created = self
                    .assignment_repository
                    .create(NewAssignment {
                        user_id: input.user_id,
                        role_id: input.role_id,
                        assigned_by: input.assigned_by,
                        expires_at: input.expires_at,
                    })
                    .await;

                match created {
                    Err(AppError::Conflict(_)) => {
                        let existing = self
                            .assignment_repository
                            .find_by_user_and_role(input.user_id, input.role_id)
                            .await?
                            .ok_or_else(|| {
                                AppError::Internal(format!(
                                    "assignment for user '{}' and role '{}' vanished after conflict",
                                    input.user_id, input.role_id
                                ))
                            })?;
                        self.reactivate_or_reject(existing, &input).await
                    }
                    other => other,
                }
            }
        }
    }

    /// Removes a role from a user.
    ///
    /// The default path soft-deletes so the row stays available for audit;
    /// `hard` removes the row entirely.
    pub async fn remove_role(&self, user_id: UserId, role_id: RoleId, hard: bool) -> AppResult<()> {
        let existing = self
            .assignment_repository
            .find_by_user_and_role(user_id, role_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "assignment of role '{role_id}' to user '{user_id}' was not found"
                ))
            })?;

        if hard {
            self.assignment_repository.delete(existing.id()).await
        } else {
            self.assignment_repository
                .deactivate(existing.id())
                .await
                .map(|_| ())
        }
    }

    /// Lists a user's assignments with roles joined in.
    pub async fn list_user_assignments(
        &self,
        user_id: UserId,
        include_inactive: bool,
    ) -> AppResult<Vec<AssignmentWithRole>> {
        self.assignment_repository
            .list_for_user(user_id, include_inactive)
            .await
    }

    /// Lists the holders of a role with user summaries joined in.
    pub async fn list_role_members(
        &self,
        role_id: RoleId,
        include_inactive: bool,
    ) -> AppResult<Vec<AssignmentWithUser>> {
        self.get_role(role_id).await?;
        self.assignment_repository
            .list_for_role(role_id, include_inactive)
            .await
    }

    async fn require_user(&self, user_id: UserId, label: &str) -> AppResult<()> {
        self.user_directory
            .find_user_by_id(user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("{label} '{user_id}' was not found")))
    }

    async fn reactivate_or_reject(
        &self,
        existing: RoleAssignment,
        input: &AssignRoleInput,
    ) -> AppResult<RoleAssignment> {
        if existing.is_active() {
            return Err(AppError::Conflict(format!(
                "user '{}' already holds role '{}'",
                input.user_id, input.role_id
            )));
        }

        self.assignment_repository
            .update(
                existing.id(),
                AssignmentUpdate {
                    is_active: Some(true),
                    expires_at: Some(input.expires_at),
                },
            )
            .await
    }
}
