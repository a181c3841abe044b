use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use lexvault_application::{AssignmentWithRole, AssignmentWithUser};
use lexvault_domain::{Role, RoleAssignment};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incoming payload for role creation.
///
/// Required fields are optional at the serde layer so the handler can reject
/// them with the envelope instead of a bare deserialization failure.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<BTreeMap<String, Vec<String>>>,
}

/// Incoming payload for partial role updates.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<BTreeMap<String, Vec<String>>>,
}

/// Incoming payload for role assignment.
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub user_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Query flag for assignment listings.
#[derive(Debug, Default, Deserialize)]
pub struct IncludeInactiveQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Query flag selecting hard deletion on unassignment.
#[derive(Debug, Default, Deserialize)]
pub struct RemoveRoleQuery {
    #[serde(default)]
    pub hard: bool,
}

/// API representation of a role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub permissions: BTreeMap<String, Vec<String>>,
    pub is_system_role: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API representation of a user-role assignment.
#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub id: String,
    pub user_id: String,
    pub role_id: String,
    pub assigned_by: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's assignment with the granted role joined in.
#[derive(Debug, Serialize)]
pub struct UserRoleResponse {
    pub role: RoleResponse,
    pub assignment: AssignmentResponse,
}

/// A role member with the assignment metadata joined in.
#[derive(Debug, Serialize)]
pub struct RoleMemberResponse {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub assignment: AssignmentResponse,
}

/// Merged permission structure for one user.
#[derive(Debug, Serialize)]
pub struct MergedPermissionsResponse {
    pub permissions: BTreeMap<String, Vec<String>>,
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            id: value.id().to_string(),
            name: value.name().as_str().to_owned(),
            description: value.description().map(str::to_owned),
            permissions: value.permissions().to_transport(),
            is_system_role: value.is_system_role(),
            created_at: value.created_at(),
            updated_at: value.updated_at(),
        }
    }
}

impl From<RoleAssignment> for AssignmentResponse {
    fn from(value: RoleAssignment) -> Self {
        Self {
            id: value.id().to_string(),
            user_id: value.user_id().to_string(),
            role_id: value.role_id().to_string(),
            assigned_by: value.assigned_by().map(|assigner| assigner.to_string()),
            assigned_at: value.assigned_at(),
            expires_at: value.expires_at(),
            is_active: value.is_active(),
            created_at: value.created_at(),
            updated_at: value.updated_at(),
        }
    }
}

impl From<AssignmentWithRole> for UserRoleResponse {
    fn from(value: AssignmentWithRole) -> Self {
        Self {
            role: RoleResponse::from(value.role),
            assignment: AssignmentResponse::from(value.assignment),
        }
    }
}

impl From<AssignmentWithUser> for RoleMemberResponse {
    fn from(value: AssignmentWithUser) -> Self {
        Self {
            user_id: value.user.id.to_string(),
            display_name: value.user.display_name,
            email: value.user.email,
            assignment: AssignmentResponse::from(value.assignment),
        }
    }
}
