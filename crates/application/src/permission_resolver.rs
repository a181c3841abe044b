use std::sync::Arc;

use lexvault_core::{AppResult, UserId};
use lexvault_domain::{Action, PermissionSet, Resource};

use crate::access_ports::{AssignmentRepository, AssignmentWithRole};

/// Application service answering permission and role-membership queries.
///
/// Every query re-reads the store so decisions always reflect current
/// assignments; the resolver holds no cache by design.
#[derive(Clone)]
pub struct PermissionResolver {
    assignment_repository: Arc<dyn AssignmentRepository>,
}

impl PermissionResolver {
    /// Creates a new resolver from a repository implementation.
    #[must_use]
    pub fn new(assignment_repository: Arc<dyn AssignmentRepository>) -> Self {
        Self {
            assignment_repository,
        }
    }

    /// Lists the user's effective assignments with their roles joined in.
    ///
    /// A user with no assignments yields an empty list, never an error.
    pub async fn effective_assignments(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<AssignmentWithRole>> {
        self.assignment_repository.list_for_user(user_id, false).await
    }

    /// Returns the union of permission structures across the user's
    /// effective roles.
    ///
    /// Merging is strictly additive: there is no explicit-deny concept, so a
    /// grant from any role survives into the merged structure.
    pub async fn effective_permissions(&self, user_id: UserId) -> AppResult<PermissionSet> {
        let assignments = self.effective_assignments(user_id).await?;

        let mut merged = PermissionSet::new();
        for entry in &assignments {
            merged.merge(entry.role.permissions());
        }

        Ok(merged)
    }

    /// Returns whether the user may perform the action on the resource.
    ///
    /// Short-circuits on the first role granting the pair; the full merged
    /// structure is only built by [`Self::effective_permissions`].
    pub async fn has_permission(
        &self,
        user_id: UserId,
        resource: Resource,
        action: Action,
    ) -> AppResult<bool> {
        let assignments = self.effective_assignments(user_id).await?;

        Ok(assignments
            .iter()
            .any(|entry| entry.role.permissions().allows(resource, action)))
    }

    /// Returns whether the user holds at least one of the named roles.
    ///
    /// This is the coarse check used for admin-style gating; names compare
    /// case-sensitively against the stored role names.
    pub async fn has_any_role(
        &self,
        user_id: UserId,
        allowed_role_names: &[&str],
    ) -> AppResult<bool> {
        let assignments = self.effective_assignments(user_id).await?;

        Ok(assignments.iter().any(|entry| {
            allowed_role_names
                .iter()
                .any(|name| entry.role.name().as_str() == *name)
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use tokio::sync::Mutex;

    use lexvault_core::{AppError, AppResult, NonEmptyString, UserId};
    use lexvault_domain::{
        Action, AssignmentId, PermissionSet, Resource, Role, RoleAssignment, RoleId,
    };

    use crate::access_ports::{
        AssignmentRepository, AssignmentUpdate, AssignmentWithRole, AssignmentWithUser,
        NewAssignment,
    };

    use super::PermissionResolver;

    struct FakeAssignmentRepository {
        rows: Mutex<Vec<AssignmentWithRole>>,
    }

    impl FakeAssignmentRepository {
        fn with_rows(rows: Vec<AssignmentWithRole>) -> Self {
            Self {
                rows: Mutex::new(rows),
            }
        }
    }

    #[async_trait]
    impl AssignmentRepository for FakeAssignmentRepository {
        async fn create(&self, _new_assignment: NewAssignment) -> AppResult<RoleAssignment> {
            Err(AppError::Internal("not used by resolver tests".to_owned()))
        }

        async fn find_by_id(
            &self,
            _assignment_id: AssignmentId,
        ) -> AppResult<Option<RoleAssignment>> {
            Ok(None)
        }

        async fn find_by_user_and_role(
            &self,
            _user_id: UserId,
            _role_id: RoleId,
        ) -> AppResult<Option<RoleAssignment>> {
            Ok(None)
        }

        async fn list_for_user(
            &self,
            user_id: UserId,
            include_inactive: bool,
        ) -> AppResult<Vec<AssignmentWithRole>> {
            let now = Utc::now();
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .filter(|entry| entry.assignment.user_id() == user_id)
                .filter(|entry| include_inactive || entry.assignment.is_effective(now))
                .cloned()
                .collect())
        }

        async fn list_for_role(
            &self,
            _role_id: RoleId,
            _include_inactive: bool,
        ) -> AppResult<Vec<AssignmentWithUser>> {
            Ok(Vec::new())
        }

        async fn update(
            &self,
            _assignment_id: AssignmentId,
            _update: AssignmentUpdate,
        ) -> AppResult<RoleAssignment> {
            Err(AppError::Internal("not used by resolver tests".to_owned()))
        }

        async fn deactivate(&self, _assignment_id: AssignmentId) -> AppResult<RoleAssignment> {
            Err(AppError::Internal("not used by resolver tests".to_owned()))
        }

        async fn delete(&self, _assignment_id: AssignmentId) -> AppResult<()> {
            Ok(())
        }

        async fn delete_by_user_and_role(
            &self,
            _user_id: UserId,
            _role_id: RoleId,
        ) -> AppResult<()> {
            Ok(())
        }

        async fn count_effective_for_role(&self, _role_id: RoleId) -> AppResult<u64> {
            Ok(0)
        }
    }

    fn role_named(name: &str, grants: &[(Resource, Action)]) -> Role {
        let now = Utc::now();
        let mut permissions = PermissionSet::new();
        for (resource, action) in grants {
            permissions.grant(*resource, *action);
        }

        Role::new(
            RoleId::new(),
            NonEmptyString::new(name).unwrap_or_else(|_| {
                unreachable!("test role names are non-empty")
            }),
            None,
            permissions,
            false,
            now,
            now,
        )
    }

    fn entry(
        user_id: UserId,
        role: Role,
        is_active: bool,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> AssignmentWithRole {
        let now = Utc::now();
        AssignmentWithRole {
            assignment: RoleAssignment::new(
                AssignmentId::new(),
                user_id,
                role.id(),
                None,
                now,
                expires_at,
                is_active,
                now,
                now,
            ),
            role,
        }
    }

    fn resolver_with(rows: Vec<AssignmentWithRole>) -> PermissionResolver {
        PermissionResolver::new(Arc::new(FakeAssignmentRepository::with_rows(rows)))
    }

    #[tokio::test]
    async fn merges_grants_across_roles() {
        let user_id = UserId::new();
        let reader = role_named("Document Reader", &[(Resource::Documents, Action::Read)]);
        let remover = role_named("Document Remover", &[(Resource::Documents, Action::Delete)]);
        let resolver = resolver_with(vec![
            entry(user_id, reader, true, None),
            entry(user_id, remover, true, None),
        ]);

        let merged = resolver.effective_permissions(user_id).await;
        let transport = merged.map(|permissions| permissions.to_transport()).ok();
        assert_eq!(
            transport.and_then(|map| map.get("documents").cloned()),
            Some(vec!["read".to_owned(), "delete".to_owned()])
        );
    }

    #[tokio::test]
    async fn grants_permission_when_any_role_allows() {
        let user_id = UserId::new();
        let counsel = role_named(
            "Counsel",
            &[(Resource::Documents, Action::Read), (Resource::Documents, Action::Update)],
        );
        let resolver = resolver_with(vec![entry(user_id, counsel, true, None)]);

        assert_eq!(
            resolver
                .has_permission(user_id, Resource::Documents, Action::Update)
                .await
                .ok(),
            Some(true)
        );
        assert_eq!(
            resolver
                .has_permission(user_id, Resource::Documents, Action::Delete)
                .await
                .ok(),
            Some(false)
        );
    }

    #[tokio::test]
    async fn expired_assignment_does_not_contribute() {
        let user_id = UserId::new();
        let counsel = role_named("Counsel", &[(Resource::Documents, Action::Read)]);
        let expired = entry(
            user_id,
            counsel,
            true,
            Some(Utc::now() - Duration::hours(1)),
        );
        let resolver = resolver_with(vec![expired]);

        assert_eq!(
            resolver
                .has_permission(user_id, Resource::Documents, Action::Read)
                .await
                .ok(),
            Some(false)
        );
        assert_eq!(resolver.has_any_role(user_id, &["Counsel"]).await.ok(), Some(false));
    }

    #[tokio::test]
    async fn inactive_assignment_does_not_contribute() {
        let user_id = UserId::new();
        let counsel = role_named("Counsel", &[(Resource::Documents, Action::Read)]);
        let resolver = resolver_with(vec![entry(user_id, counsel, false, None)]);

        let merged = resolver.effective_permissions(user_id).await;
        assert_eq!(merged.map(|permissions| permissions.is_empty()).ok(), Some(true));
    }

    #[tokio::test]
    async fn no_assignments_is_a_valid_empty_state() {
        let user_id = UserId::new();
        let resolver = resolver_with(Vec::new());

        let merged = resolver.effective_permissions(user_id).await;
        assert_eq!(merged.map(|permissions| permissions.is_empty()).ok(), Some(true));
        assert_eq!(
            resolver.has_any_role(user_id, &["Platform Administrator"]).await.ok(),
            Some(false)
        );
    }

    #[tokio::test]
    async fn role_check_matches_exact_name() {
        let user_id = UserId::new();
        let counsel = role_named("Counsel", &[(Resource::Documents, Action::Read)]);
        let resolver = resolver_with(vec![entry(user_id, counsel, true, None)]);

        assert_eq!(
            resolver.has_any_role(user_id, &["Legal Admin", "Counsel"]).await.ok(),
            Some(true)
        );
        assert_eq!(resolver.has_any_role(user_id, &["counsel"]).await.ok(), Some(false));
    }
}
