use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use lexvault_application::{
    AssignmentRepository, AssignmentUpdate, AssignmentWithRole, AssignmentWithUser, NewAssignment,
    UserSummary,
};
use lexvault_core::{AppError, AppResult, NonEmptyString, UserId};
use lexvault_domain::{
    Action, AssignmentId, PermissionSet, Resource, Role, RoleAssignment, RoleId,
};

/// PostgreSQL-backed repository for user-role assignment records.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    role_id: uuid::Uuid,
    assigned_by: Option<uuid::Uuid>,
    assigned_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct AssignmentWithRoleRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    role_id: uuid::Uuid,
    assigned_by: Option<uuid::Uuid>,
    assigned_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    role_name: String,
    role_description: Option<String>,
    is_system_role: bool,
    role_created_at: DateTime<Utc>,
    role_updated_at: DateTime<Utc>,
    resource: Option<String>,
    action: Option<String>,
}

#[derive(Debug, FromRow)]
struct AssignmentWithUserRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    role_id: uuid::Uuid,
    assigned_by: Option<uuid::Uuid>,
    assigned_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    display_name: String,
    email: Option<String>,
}

// Keep this SQL predicate in lockstep with `RoleAssignment::is_effective`.
const EFFECTIVE_PREDICATE: &str =
    "(user_roles.is_active AND (user_roles.expires_at IS NULL OR user_roles.expires_at > now()))";

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn create(&self, new_assignment: NewAssignment) -> AppResult<RoleAssignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO user_roles (user_id, role_id, assigned_by, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, role_id, assigned_by, assigned_at,
                expires_at, is_active, created_at, updated_at
            "#,
        )
        .bind(new_assignment.user_id.as_uuid())
        .bind(new_assignment.role_id.as_uuid())
        .bind(new_assignment.assigned_by.map(|value| value.as_uuid()))
        .bind(new_assignment.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_assignment_conflict)?;

        Ok(assignment_from_row(row))
    }

    async fn find_by_id(&self, assignment_id: AssignmentId) -> AppResult<Option<RoleAssignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, user_id, role_id, assigned_by, assigned_at,
                expires_at, is_active, created_at, updated_at
            FROM user_roles
            WHERE id = $1
            "#,
        )
        .bind(assignment_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load assignment: {error}")))?;

        Ok(row.map(assignment_from_row))
    }

    async fn find_by_user_and_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
    ) -> AppResult<Option<RoleAssignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, user_id, role_id, assigned_by, assigned_at,
                expires_at, is_active, created_at, updated_at
            FROM user_roles
            WHERE user_id = $1 AND role_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load assignment: {error}")))?;

        Ok(row.map(assignment_from_row))
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        include_inactive: bool,
    ) -> AppResult<Vec<AssignmentWithRole>> {
        let rows = sqlx::query_as::<_, AssignmentWithRoleRow>(&format!(
            r#"
            SELECT
                user_roles.id, user_roles.user_id, user_roles.role_id,
                user_roles.assigned_by, user_roles.assigned_at, user_roles.expires_at,
                user_roles.is_active, user_roles.created_at, user_roles.updated_at,
                roles.name AS role_name,
                roles.description AS role_description,
                roles.is_system_role,
                roles.created_at AS role_created_at,
                roles.updated_at AS role_updated_at,
                grants.resource,
                grants.action
            FROM user_roles
            INNER JOIN roles ON roles.id = user_roles.role_id
            LEFT JOIN role_permissions AS grants ON grants.role_id = roles.id
            WHERE user_roles.user_id = $1 AND ($2 OR {EFFECTIVE_PREDICATE})
            ORDER BY roles.name, grants.resource, grants.action
            "#
        ))
        .bind(user_id.as_uuid())
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list assignments for user: {error}"))
        })?;

        aggregate_assignments_with_role(rows)
    }

    async fn list_for_role(
        &self,
        role_id: RoleId,
        include_inactive: bool,
    ) -> AppResult<Vec<AssignmentWithUser>> {
        let rows = sqlx::query_as::<_, AssignmentWithUserRow>(&format!(
            r#"
            SELECT
                user_roles.id, user_roles.user_id, user_roles.role_id,
                user_roles.assigned_by, user_roles.assigned_at, user_roles.expires_at,
                user_roles.is_active, user_roles.created_at, user_roles.updated_at,
                users.display_name,
                users.email
            FROM user_roles
            INNER JOIN users ON users.id = user_roles.user_id
            WHERE user_roles.role_id = $1 AND ($2 OR {EFFECTIVE_PREDICATE})
            ORDER BY users.display_name, user_roles.assigned_at
            "#
        ))
        .bind(role_id.as_uuid())
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list assignments for role: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| AssignmentWithUser {
                user: UserSummary {
                    id: UserId::from_uuid(row.user_id),
                    display_name: row.display_name.clone(),
                    email: row.email.clone(),
                },
                assignment: assignment_from_row(AssignmentRow {
                    id: row.id,
                    user_id: row.user_id,
                    role_id: row.role_id,
                    assigned_by: row.assigned_by,
                    assigned_at: row.assigned_at,
                    expires_at: row.expires_at,
                    is_active: row.is_active,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                }),
            })
            .collect())
    }

    async fn update(
        &self,
        assignment_id: AssignmentId,
        update: AssignmentUpdate,
    ) -> AppResult<RoleAssignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            UPDATE user_roles
            SET is_active = COALESCE($2, is_active),
                expires_at = CASE WHEN $3 THEN $4 ELSE expires_at END,
                updated_at = now()
            WHERE id = $1
            RETURNING id, user_id, role_id, assigned_by, assigned_at,
                expires_at, is_active, created_at, updated_at
            "#,
        )
        .bind(assignment_id.as_uuid())
        .bind(update.is_active)
        .bind(update.expires_at.is_some())
        .bind(update.expires_at.flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update assignment: {error}")))?
        .ok_or_else(|| {
            AppError::NotFound(format!("assignment '{assignment_id}' was not found"))
        })?;

        Ok(assignment_from_row(row))
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
        let rows_affected = sqlx::query("DELETE FROM user_roles WHERE id = $1")
            .bind(assignment_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete assignment: {error}")))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "assignment '{assignment_id}' was not found"
            )));
        }

        Ok(())
    }

    async fn delete_by_user_and_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        let rows_affected =
            sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
                .bind(user_id.as_uuid())
                .bind(role_id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to delete assignment: {error}"))
                })?
                .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "assignment of role '{role_id}' to user '{user_id}' was not found"
            )));
        }

        Ok(())
    }

    async fn count_effective_for_role(&self, role_id: RoleId) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM user_roles WHERE user_roles.role_id = $1 AND {EFFECTIVE_PREDICATE}"
        ))
        .bind(role_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count assignments: {error}")))?;

        Ok(count.max(0) as u64)
    }
}

fn assignment_from_row(row: AssignmentRow) -> RoleAssignment {
    RoleAssignment::new(
        AssignmentId::from_uuid(row.id),
        UserId::from_uuid(row.user_id),
        RoleId::from_uuid(row.role_id),
        row.assigned_by.map(UserId::from_uuid),
        row.assigned_at,
        row.expires_at,
        row.is_active,
        row.created_at,
        row.updated_at,
    )
}

fn aggregate_assignments_with_role(
    rows: Vec<AssignmentWithRoleRow>,
) -> AppResult<Vec<AssignmentWithRole>> {
    struct PartialEntry {
        assignment: RoleAssignment,
        role_name: String,
        role_description: Option<String>,
        is_system_role: bool,
        role_created_at: DateTime<Utc>,
        role_updated_at: DateTime<Utc>,
        permissions: PermissionSet,
    }

    let mut by_id: HashMap<uuid::Uuid, PartialEntry> = HashMap::new();

    for row in rows {
        let entry = by_id.entry(row.id).or_insert_with(|| PartialEntry {
            assignment: assignment_from_row(AssignmentRow {
                id: row.id,
                user_id: row.user_id,
                role_id: row.role_id,
                assigned_by: row.assigned_by,
                assigned_at: row.assigned_at,
                expires_at: row.expires_at,
                is_active: row.is_active,
                created_at: row.created_at,
                updated_at: row.updated_at,
            }),
            role_name: row.role_name.clone(),
            role_description: row.role_description.clone(),
            is_system_role: row.is_system_role,
            role_created_at: row.role_created_at,
            role_updated_at: row.role_updated_at,
            permissions: PermissionSet::new(),
        });

        if let (Some(resource_value), Some(action_value)) = (row.resource, row.action) {
            let resource = Resource::from_str(resource_value.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "invalid stored resource '{resource_value}': {error}"
                ))
            })?;
            let action = Action::from_str(action_value.as_str()).map_err(|error| {
                AppError::Internal(format!("invalid stored action '{action_value}': {error}"))
            })?;
            entry.permissions.grant(resource, action);
        }
    }

    let mut entries = Vec::with_capacity(by_id.len());
    for partial in by_id.into_values() {
        let role_id = partial.assignment.role_id();
        entries.push(AssignmentWithRole {
            assignment: partial.assignment,
            role: Role::new(
                role_id,
                NonEmptyString::new(partial.role_name)?,
                partial.role_description,
                partial.permissions,
                partial.is_system_role,
                partial.role_created_at,
                partial.role_updated_at,
            ),
        });
    }
    entries.sort_by(|left, right| {
        left.role
            .name()
            .as_str()
            .cmp(right.role.name().as_str())
    });
    Ok(entries)
}

fn map_assignment_conflict(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        match database_error.code().as_deref() {
            // Unique violation on (user_id, role_id): the row already exists.
            Some("23505") => {
                return AppError::Conflict(
                    "assignment already exists for user and role".to_owned(),
                );
            }
            // Foreign-key violation: the user or role vanished between the
            // caller's existence check and this insert.
            Some("23503") => {
                return AppError::NotFound(
                    "referenced user or role no longer exists".to_owned(),
                );
            }
            _ => {}
        }
    }

    AppError::Internal(format!("failed to create assignment: {error}"))
}
