use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexvault_core::{AppResult, UserId};
use lexvault_domain::{AssignmentId, Role, RoleAssignment, RoleId};

use super::users::UserSummary;

/// Input payload for persisting a new assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    /// User receiving the role.
    pub user_id: UserId,
    /// Role being granted.
    pub role_id: RoleId,
    /// User who created the assignment, if any.
    pub assigned_by: Option<UserId>,
    /// Optional expiry after which the assignment stops contributing.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update applied to a stored assignment.
///
/// `expires_at` is doubly optional: the outer level means "touch this field",
/// the inner level is the stored nullable value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentUpdate {
    /// Replacement activation flag.
    pub is_active: Option<bool>,
    /// Replacement expiry (`Some(None)` clears a stored expiry).
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// An assignment joined with its role, as returned by user-scoped listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentWithRole {
    /// The assignment row.
    pub assignment: RoleAssignment,
    /// The referenced role.
    pub role: Role,
}

/// An assignment joined with the holder, as returned by role-scoped listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentWithUser {
    /// The assignment row.
    pub assignment: RoleAssignment,
    /// The user holding the role.
    pub user: UserSummary,
}

/// Repository port owning persistent user-role assignment records.
///
/// When `include_inactive` is false, listings return only rows satisfying
/// `is_active AND (expires_at IS NULL OR expires_at > now)` — every
/// downstream permission decision depends on this predicate being applied
/// consistently. A `(user_id, role_id)` pair holds at most one row; the
/// store's uniqueness constraint is the authority under concurrent writes
/// and surfaces as `AppError::Conflict`.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Persists a new active assignment.
    async fn create(&self, new_assignment: NewAssignment) -> AppResult<RoleAssignment>;

    /// Finds an assignment by identifier.
    async fn find_by_id(&self, assignment_id: AssignmentId) -> AppResult<Option<RoleAssignment>>;

    /// Finds the row for a user-role pair regardless of activation state.
    async fn find_by_user_and_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
    ) -> AppResult<Option<RoleAssignment>>;

    /// Lists a user's assignments with their roles joined in.
    async fn list_for_user(
        &self,
        user_id: UserId,
        include_inactive: bool,
    ) -> AppResult<Vec<AssignmentWithRole>>;

    /// Lists a role's assignments with the holders joined in.
    async fn list_for_role(
        &self,
        role_id: RoleId,
        include_inactive: bool,
    ) -> AppResult<Vec<AssignmentWithUser>>;

    /// Applies a partial update and returns the stored assignment.
    async fn update(
        &self,
        assignment_id: AssignmentId,
        update: AssignmentUpdate,
    ) -> AppResult<RoleAssignment>;

    /// Soft-deletes an assignment by clearing its activation flag.
    async fn deactivate(&self, assignment_id: AssignmentId) -> AppResult<RoleAssignment>;

    /// Hard-deletes an assignment row.
    async fn delete(&self, assignment_id: AssignmentId) -> AppResult<()>;

    /// Hard-deletes the row for a user-role pair.
    async fn delete_by_user_and_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()>;

    /// Counts effective assignments referencing a role.
    async fn count_effective_for_role(&self, role_id: RoleId) -> AppResult<u64>;
}
