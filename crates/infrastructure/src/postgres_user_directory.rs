use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use lexvault_application::{UserDirectory, UserSummary};
use lexvault_core::{AppError, AppResult, UserId};

/// PostgreSQL-backed lookup into the identity subsystem's user table.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: uuid::Uuid,
    display_name: String,
    email: Option<String>,
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_user_by_id(&self, user_id: UserId) -> AppResult<Option<UserSummary>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, display_name, email
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load user: {error}")))?;

        Ok(row.map(|row| UserSummary {
            id: UserId::from_uuid(row.id),
            display_name: row.display_name,
            email: row.email,
        }))
    }
}
