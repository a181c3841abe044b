use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use lexvault_application::{NewRole, RoleRepository, RoleUpdate};
use lexvault_core::{AppError, AppResult, NonEmptyString};
use lexvault_domain::{Action, PermissionSet, Resource, Role, RoleId};

/// PostgreSQL-backed repository for role records.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: uuid::Uuid,
    role_name: String,
    role_description: Option<String>,
    is_system_role: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    resource: Option<String>,
    action: Option<String>,
}

const ROLE_SELECT: &str = r#"
    SELECT
        roles.id AS role_id,
        roles.name AS role_name,
        roles.description AS role_description,
        roles.is_system_role,
        roles.created_at,
        roles.updated_at,
        grants.resource,
        grants.action
    FROM roles
    LEFT JOIN role_permissions AS grants
        ON grants.role_id = roles.id
"#;

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn create(&self, new_role: NewRole) -> AppResult<Role> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let row = sqlx::query_as::<_, (uuid::Uuid, DateTime<Utc>, DateTime<Utc>)>(
            r#"
            INSERT INTO roles (name, description, is_system_role)
            VALUES ($1, $2, $3)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(new_role.name.as_str())
        .bind(new_role.description.as_deref())
        .bind(new_role.is_system_role)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_name_conflict(error, new_role.name.as_str()))?;

        insert_grants(&mut transaction, row.0, &new_role.permissions).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(Role::new(
            RoleId::from_uuid(row.0),
            new_role.name,
            new_role.description,
            new_role.permissions,
            new_role.is_system_role,
            row.1,
            row.2,
        ))
    }

    async fn find_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!("{ROLE_SELECT} WHERE roles.id = $1"))
            .bind(role_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        Ok(aggregate_roles(rows)?.pop())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!("{ROLE_SELECT} WHERE roles.name = $1"))
            .bind(name)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        Ok(aggregate_roles(rows)?.pop())
    }

    async fn list_all(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "{ROLE_SELECT} ORDER BY roles.name, grants.resource, grants.action"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        aggregate_roles(rows)
    }

    async fn update(&self, role_id: RoleId, update: RoleUpdate) -> AppResult<Role> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let existing = sqlx::query_as::<_, (String, Option<String>, bool, DateTime<Utc>)>(
            r#"
            SELECT name, description, is_system_role, created_at
            FROM roles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        let name = update
            .name
            .clone()
            .map(String::from)
            .unwrap_or_else(|| existing.0.clone());
        let description = update.description.clone().or_else(|| existing.1.clone());

        let updated_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            UPDATE roles
            SET name = $2, description = $3, updated_at = now()
            WHERE id = $1
            RETURNING updated_at
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(name.as_str())
        .bind(description.as_deref())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_name_conflict(error, name.as_str()))?;

        let permissions = match update.permissions {
            Some(permissions) => {
                sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
                    .bind(role_id.as_uuid())
                    .execute(&mut *transaction)
                    .await
                    .map_err(|error| {
                        AppError::Internal(format!("failed to clear role grants: {error}"))
                    })?;
                insert_grants(&mut transaction, role_id.as_uuid(), &permissions).await?;
                permissions
            }
            None => {
                let grant_rows = sqlx::query_as::<_, (String, String)>(
                    "SELECT resource, action FROM role_permissions WHERE role_id = $1",
                )
                .bind(role_id.as_uuid())
                .fetch_all(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to load role grants: {error}"))
                })?;
                permissions_from_rows(grant_rows)?
            }
        };

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(Role::new(
            role_id,
            NonEmptyString::new(name)?,
            description,
            permissions,
            existing.2,
            existing.3,
            updated_at,
        ))
    }

    async fn delete(&self, role_id: RoleId) -> AppResult<()> {
        let rows_affected = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        Ok(())
    }
}

async fn insert_grants(
    transaction: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    role_id: uuid::Uuid,
    permissions: &PermissionSet,
) -> AppResult<()> {
    for (resource, actions) in permissions.iter() {
        for action in actions {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, resource, action)
                VALUES ($1, $2, $3)
                ON CONFLICT (role_id, resource, action) DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(resource.as_str())
            .bind(action.as_str())
            .execute(&mut **transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist role grants: {error}"))
            })?;
        }
    }

    Ok(())
}

fn permissions_from_rows(rows: Vec<(String, String)>) -> AppResult<PermissionSet> {
    let mut permissions = PermissionSet::new();

    for (resource_value, action_value) in rows {
        let resource = Resource::from_str(resource_value.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid stored resource '{resource_value}': {error}"))
        })?;
        let action = Action::from_str(action_value.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid stored action '{action_value}': {error}"))
        })?;
        permissions.grant(resource, action);
    }

    Ok(permissions)
}

fn aggregate_roles(rows: Vec<RoleRow>) -> AppResult<Vec<Role>> {
    struct PartialRole {
        name: String,
        description: Option<String>,
        is_system_role: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        permissions: PermissionSet,
    }

    let mut by_id: HashMap<uuid::Uuid, PartialRole> = HashMap::new();

    for row in rows {
        let partial = by_id.entry(row.role_id).or_insert_with(|| PartialRole {
            name: row.role_name.clone(),
            description: row.role_description.clone(),
            is_system_role: row.is_system_role,
            created_at: row.created_at,
            updated_at: row.updated_at,
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
            partial.permissions.grant(resource, action);
        }
    }

    let mut roles = Vec::with_capacity(by_id.len());
    for (role_id, partial) in by_id {
        roles.push(Role::new(
            RoleId::from_uuid(role_id),
            NonEmptyString::new(partial.name)?,
            partial.description,
            partial.permissions,
            partial.is_system_role,
            partial.created_at,
            partial.updated_at,
        ));
    }
    roles.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
    Ok(roles)
}

fn map_name_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to persist role: {error}"))
}
