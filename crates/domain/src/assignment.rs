use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use lexvault_core::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::RoleId;

/// Unique identifier for a role-assignment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(Uuid);

impl AssignmentId {
    /// Creates a new random assignment identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an assignment identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AssignmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AssignmentId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A user-to-role link with temporal validity and activation state.
///
/// Rows are soft-removed by flipping `is_active` so the audit trail keeps the
/// history; only [`RoleAssignment::is_effective`] rows contribute to
/// permission decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    id: AssignmentId,
    user_id: UserId,
    role_id: RoleId,
    assigned_by: Option<UserId>,
    assigned_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleAssignment {
    /// Creates an assignment from already-validated parts.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AssignmentId,
        user_id: UserId,
        role_id: RoleId,
        assigned_by: Option<UserId>,
        assigned_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            role_id,
            assigned_by,
            assigned_at,
            expires_at,
            is_active,
            created_at,
            updated_at,
        }
    }

    /// Returns the stable assignment identifier.
    #[must_use]
    pub fn id(&self) -> AssignmentId {
        self.id
    }

    /// Returns the user holding the role.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the assigned role.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the user who created the assignment, if recorded.
    #[must_use]
    pub fn assigned_by(&self) -> Option<UserId> {
        self.assigned_by
    }

    /// Returns when the role was granted.
    #[must_use]
    pub fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }

    /// Returns the optional expiry timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns the activation flag. Inactive rows are retained for audit.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-modification timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the assignment contributes to permission decisions.
    ///
    /// The predicate is `is_active AND (expires_at IS NULL OR expires_at >
    /// now)`; storage adapters must apply the exact same filter in queries.
    #[must_use]
    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}
