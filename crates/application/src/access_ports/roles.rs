use async_trait::async_trait;
use lexvault_core::{AppResult, NonEmptyString};
use lexvault_domain::{PermissionSet, Role, RoleId};

/// Input payload for persisting a new role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    /// Globally unique role name.
    pub name: NonEmptyString,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Grants to attach to the role.
    pub permissions: PermissionSet,
    /// Marks the role as system-managed.
    pub is_system_role: bool,
}

/// Partial update applied to a stored role.
///
/// Absent fields are left untouched; the store bumps `updated_at` on every
/// applied update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleUpdate {
    /// Replacement name.
    pub name: Option<NonEmptyString>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement permission structure.
    pub permissions: Option<PermissionSet>,
}

impl RoleUpdate {
    /// Returns whether the update carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.permissions.is_none()
    }
}

/// Repository port owning persistent role records.
///
/// Identifier and timestamp assignment happen inside the store; the unique
/// name constraint is enforced there as well and surfaces as
/// `AppError::Conflict`.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists a new role.
    async fn create(&self, new_role: NewRole) -> AppResult<Role>;

    /// Finds a role by identifier.
    async fn find_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by exact, case-sensitive name.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// Lists every role, ordered by name.
    async fn list_all(&self) -> AppResult<Vec<Role>>;

    /// Applies a partial update and returns the stored role.
    async fn update(&self, role_id: RoleId, update: RoleUpdate) -> AppResult<Role>;

    /// Hard-deletes a role and its grants.
    async fn delete(&self, role_id: RoleId) -> AppResult<()>;
}
