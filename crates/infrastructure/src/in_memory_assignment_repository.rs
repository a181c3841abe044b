use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use lexvault_application::{
    AssignmentRepository, AssignmentUpdate, AssignmentWithRole, AssignmentWithUser, NewAssignment,
    RoleRepository, UserDirectory,
};
use lexvault_core::{AppError, AppResult, UserId};
use lexvault_domain::{AssignmentId, RoleAssignment, RoleId};

use crate::in_memory_role_repository::InMemoryRoleRepository;
use crate::in_memory_user_directory::InMemoryUserDirectory;

/// In-memory assignment repository used by tests and local development.
///
/// Joins resolve against the in-memory role repository and user directory it
/// is constructed with, mirroring how the Postgres adapter joins tables.
#[derive(Debug)]
pub struct InMemoryAssignmentRepository {
    assignments: RwLock<HashMap<AssignmentId, RoleAssignment>>,
    role_repository: Arc<InMemoryRoleRepository>,
    user_directory: Arc<InMemoryUserDirectory>,
}

impl InMemoryAssignmentRepository {
    /// Creates an empty repository joined to the given stores.
    #[must_use]
    pub fn new(
        role_repository: Arc<InMemoryRoleRepository>,
        user_directory: Arc<InMemoryUserDirectory>,
    ) -> Self {
        Self {
            assignments: RwLock::new(HashMap::new()),
            role_repository,
            user_directory,
        }
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn create(&self, new_assignment: NewAssignment) -> AppResult<RoleAssignment> {
        let mut assignments = self.assignments.write().await;

        if assignments.values().any(|assignment| {
            assignment.user_id() == new_assignment.user_id
                && assignment.role_id() == new_assignment.role_id
        }) {
            return Err(AppError::Conflict(
                "assignment already exists for user and role".to_owned(),
            ));
        }

        let now = Utc::now();
        let assignment = RoleAssignment::new(
            AssignmentId::new(),
            new_assignment.user_id,
            new_assignment.role_id,
            new_assignment.assigned_by,
            now,
            new_assignment.expires_at,
            true,
            now,
            now,
        );
        assignments.insert(assignment.id(), assignment.clone());
        Ok(assignment)
    }

    async fn find_by_id(&self, assignment_id: AssignmentId) -> AppResult<Option<RoleAssignment>> {
        Ok(self.assignments.read().await.get(&assignment_id).cloned())
    }

    async fn find_by_user_and_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
    ) -> AppResult<Option<RoleAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .values()
            .find(|assignment| {
                assignment.user_id() == user_id && assignment.role_id() == role_id
            })
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        include_inactive: bool,
    ) -> AppResult<Vec<AssignmentWithRole>> {
        let now = Utc::now();
        let selected: Vec<RoleAssignment> = self
            .assignments
            .read()
            .await
            .values()
            .filter(|assignment| assignment.user_id() == user_id)
            .filter(|assignment| include_inactive || assignment.is_effective(now))
            .cloned()
            .collect();

        let mut entries = Vec::with_capacity(selected.len());
        for assignment in selected {
            let role = self
                .role_repository
                .find_by_id(assignment.role_id())
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "assignment '{}' references missing role '{}'",
                        assignment.id(),
                        assignment.role_id()
                    ))
                })?;
            entries.push(AssignmentWithRole { assignment, role });
        }
        entries.sort_by(|left, right| {
            left.role
                .name()
                .as_str()
                .cmp(right.role.name().as_str())
        });
        Ok(entries)
    }

    async fn list_for_role(
        &self,
        role_id: RoleId,
        include_inactive: bool,
    ) -> AppResult<Vec<AssignmentWithUser>> {
        let now = Utc::now();
        let selected: Vec<RoleAssignment> = self
            .assignments
            .read()
            .await
            .values()
            .filter(|assignment| assignment.role_id() == role_id)
            .filter(|assignment| include_inactive || assignment.is_effective(now))
            .cloned()
            .collect();

        let mut entries = Vec::with_capacity(selected.len());
        for assignment in selected {
            let user = self
                .user_directory
                .find_user_by_id(assignment.user_id())
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "assignment '{}' references missing user '{}'",
                        assignment.id(),
                        assignment.user_id()
                    ))
                })?;
            entries.push(AssignmentWithUser { assignment, user });
        }
        entries.sort_by(|left, right| left.user.display_name.cmp(&right.user.display_name));
        Ok(entries)
    }

    async fn update(
        &self,
        assignment_id: AssignmentId,
        update: AssignmentUpdate,
    ) -> AppResult<RoleAssignment> {
        let mut assignments = self.assignments.write().await;
        let stored = assignments.get_mut(&assignment_id).ok_or_else(|| {
            AppError::NotFound(format!("assignment '{assignment_id}' was not found"))
        })?;

        let updated = RoleAssignment::new(
            stored.id(),
            stored.user_id(),
            stored.role_id(),
            stored.assigned_by(),
            stored.assigned_at(),
            update.expires_at.unwrap_or_else(|| stored.expires_at()),
            update.is_active.unwrap_or_else(|| stored.is_active()),
            stored.created_at(),
            Utc::now(),
        );
        *stored = updated.clone();
        Ok(updated)
    }

    async fn deactivate(&self, assignment_id: AssignmentId) -> AppResult<RoleAssignment> {
        self.update(
            assignment_id,
            AssignmentUpdate {
                is_active: Some(false),
                expires_at: None,
            },
        )
        .await
    }

    async fn delete(&self, assignment_id: AssignmentId) -> AppResult<()> {
        self.assignments
            .write()
            .await
            .remove(&assignment_id)
            .map(|_| ())
            .ok_or_else(|| {
                AppError::NotFound(format!("assignment '{assignment_id}' was not found"))
            })
    }

    async fn delete_by_user_and_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        let mut assignments = self.assignments.write().await;
        let found = assignments
            .values()
            .find(|assignment| {
                assignment.user_id() == user_id && assignment.role_id() == role_id
            })
            .map(RoleAssignment::id);

        match found {
            Some(assignment_id) => {
                assignments.remove(&assignment_id);
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "assignment of role '{role_id}' to user '{user_id}' was not found"
            ))),
        }
    }

    async fn count_effective_for_role(&self, role_id: RoleId) -> AppResult<u64> {
        let now = Utc::now();
        Ok(self
            .assignments
            .read()
            .await
            .values()
            .filter(|assignment| {
                assignment.role_id() == role_id && assignment.is_effective(now)
            })
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use lexvault_application::{
        AssignmentRepository, NewAssignment, NewRole, RoleRepository, UserSummary,
    };
    use lexvault_core::{AppError, NonEmptyString, UserId};
    use lexvault_domain::{Action, PermissionSet, Resource, RoleId};

    use crate::in_memory_role_repository::InMemoryRoleRepository;
    use crate::in_memory_user_directory::InMemoryUserDirectory;

    use super::InMemoryAssignmentRepository;

    struct Fixture {
        repository: InMemoryAssignmentRepository,
        roles: Arc<InMemoryRoleRepository>,
        users: Arc<InMemoryUserDirectory>,
    }

    fn fixture() -> Fixture {
        let roles = Arc::new(InMemoryRoleRepository::new());
        let users = Arc::new(InMemoryUserDirectory::new());
        Fixture {
            repository: InMemoryAssignmentRepository::new(roles.clone(), users.clone()),
            roles,
            users,
        }
    }

    async fn seed_role(roles: &InMemoryRoleRepository, name: &str) -> RoleId {
        let mut permissions = PermissionSet::new();
        permissions.grant(Resource::Documents, Action::Read);

        let Ok(role) = roles
            .create(NewRole {
                name: NonEmptyString::new(name).unwrap_or_else(|_| {
                    unreachable!("test role names are non-empty")
                }),
                description: None,
                permissions,
                is_system_role: false,
            })
            .await
        else {
            panic!("role creation failed");
        };
        role.id()
    }

    async fn seed_user(users: &InMemoryUserDirectory, display_name: &str) -> UserId {
        let user_id = UserId::new();
        users
            .insert_user(UserSummary {
                id: user_id,
                display_name: display_name.to_owned(),
                email: None,
            })
            .await;
        user_id
    }

    fn grant(user_id: UserId, role_id: RoleId) -> NewAssignment {
        NewAssignment {
            user_id,
            role_id,
            assigned_by: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn create_rejects_second_row_for_same_pair() {
        let fixture = fixture();
        let role_id = seed_role(&fixture.roles, "Counsel").await;
        let user_id = seed_user(&fixture.users, "Dana Reyes").await;

        let first = fixture.repository.create(grant(user_id, role_id)).await;
        assert!(first.is_ok());

        let second = fixture.repository.create(grant(user_id, role_id)).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn effective_listing_excludes_inactive_and_expired_rows() {
        let fixture = fixture();
        let counsel = seed_role(&fixture.roles, "Counsel").await;
        let paralegal = seed_role(&fixture.roles, "Paralegal").await;
        let archivist = seed_role(&fixture.roles, "Archivist").await;
        let user_id = seed_user(&fixture.users, "Dana Reyes").await;

        let Ok(kept) = fixture.repository.create(grant(user_id, counsel)).await else {
            panic!("assignment failed");
        };
        let Ok(deactivated) = fixture.repository.create(grant(user_id, paralegal)).await
        else {
            panic!("assignment failed");
        };
        let expired = fixture
            .repository
            .create(NewAssignment {
                user_id,
                role_id: archivist,
                assigned_by: None,
                expires_at: Some(Utc::now() - Duration::hours(1)),
            })
            .await;
        assert!(expired.is_ok());

        let soft_removed = fixture.repository.deactivate(deactivated.id()).await;
        assert!(soft_removed.is_ok());

        let effective = fixture.repository.list_for_user(user_id, false).await;
        let effective_ids = effective
            .map(|rows| rows.iter().map(|row| row.assignment.id()).collect::<Vec<_>>())
            .unwrap_or_default();
        assert_eq!(effective_ids, vec![kept.id()]);

        let all_rows = fixture.repository.list_for_user(user_id, true).await;
        assert_eq!(all_rows.map(|rows| rows.len()).ok(), Some(3));
    }

    #[tokio::test]
    async fn effective_count_applies_the_same_predicate() {
        let fixture = fixture();
        let counsel = seed_role(&fixture.roles, "Counsel").await;
        let active_user = seed_user(&fixture.users, "Dana Reyes").await;
        let expired_user = seed_user(&fixture.users, "Riley Okafor").await;

        let active = fixture.repository.create(grant(active_user, counsel)).await;
        assert!(active.is_ok());
        let expired = fixture
            .repository
            .create(NewAssignment {
                user_id: expired_user,
                role_id: counsel,
                assigned_by: None,
                expires_at: Some(Utc::now() - Duration::minutes(5)),
            })
            .await;
        assert!(expired.is_ok());

        let count = fixture.repository.count_effective_for_role(counsel).await;
        assert_eq!(count.ok(), Some(1));
    }

    #[tokio::test]
    async fn role_listing_joins_user_summaries() {
        let fixture = fixture();
        let counsel = seed_role(&fixture.roles, "Counsel").await;
        let user_id = seed_user(&fixture.users, "Dana Reyes").await;

        let assigned = fixture.repository.create(grant(user_id, counsel)).await;
        assert!(assigned.is_ok());

        let members = fixture.repository.list_for_role(counsel, false).await;
        let names = members
            .map(|rows| {
                rows.iter()
                    .map(|row| row.user.display_name.clone())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        assert_eq!(names, vec!["Dana Reyes".to_owned()]);
    }

    #[tokio::test]
    async fn find_by_id_returns_stored_row() {
        let fixture = fixture();
        let counsel = seed_role(&fixture.roles, "Counsel").await;
        let user_id = seed_user(&fixture.users, "Dana Reyes").await;

        let Ok(created) = fixture.repository.create(grant(user_id, counsel)).await else {
            panic!("assignment failed");
        };

        let found = fixture.repository.find_by_id(created.id()).await;
        assert_eq!(found.ok().flatten().map(|row| row.id()), Some(created.id()));
    }

    #[tokio::test]
    async fn delete_by_pair_removes_the_row() {
        let fixture = fixture();
        let counsel = seed_role(&fixture.roles, "Counsel").await;
        let user_id = seed_user(&fixture.users, "Dana Reyes").await;

        let assigned = fixture.repository.create(grant(user_id, counsel)).await;
        assert!(assigned.is_ok());

        let deleted = fixture
            .repository
            .delete_by_user_and_role(user_id, counsel)
            .await;
        assert!(deleted.is_ok());

        let again = fixture
            .repository
            .delete_by_user_and_role(user_id, counsel)
            .await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }
}
