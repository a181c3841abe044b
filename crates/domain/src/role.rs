use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use lexvault_core::NonEmptyString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::{Action, PermissionSet, Resource};

/// Unique identifier for a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A named, reusable bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: NonEmptyString,
    description: Option<String>,
    permissions: PermissionSet,
    is_system_role: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Role {
    /// Creates a role from already-validated parts.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RoleId,
        name: NonEmptyString,
        description: Option<String>,
        permissions: PermissionSet,
        is_system_role: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            permissions,
            is_system_role,
            created_at,
            updated_at,
        }
    }

    /// Returns the stable role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the globally unique role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the optional free-text description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the permission structure attached to the role.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Returns whether the role is system-managed.
    ///
    /// System roles cannot be renamed or deleted.
    #[must_use]
    pub fn is_system_role(&self) -> bool {
        self.is_system_role
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
}

/// Well-known roles seeded at platform setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemRole {
    /// Full platform control, including system configuration and backups.
    PlatformAdministrator,
    /// Owns the legal content lifecycle across all departments.
    LegalAdmin,
    /// Manages users and content within one department.
    DepartmentAdmin,
    /// Works with documents inside one department.
    DepartmentUser,
}

impl SystemRole {
    /// Returns the seeded display name, also used as the stable reference.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlatformAdministrator => "Platform Administrator",
            Self::LegalAdmin => "Legal Admin",
            Self::DepartmentAdmin => "Department Admin",
            Self::DepartmentUser => "Department User",
        }
    }

    /// Returns all seeded system roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[SystemRole] = &[
            SystemRole::PlatformAdministrator,
            SystemRole::LegalAdmin,
            SystemRole::DepartmentAdmin,
            SystemRole::DepartmentUser,
        ];

        ALL
    }

    /// Returns the default grants attached to the role at seed time.
    #[must_use]
    pub fn default_permissions(&self) -> PermissionSet {
        let mut permissions = PermissionSet::new();

        match self {
            Self::PlatformAdministrator => {
                for resource in Resource::all() {
                    for action in Action::all() {
                        permissions.grant(*resource, *action);
                    }
                }
            }
            Self::LegalAdmin => {
                for resource in [
                    Resource::Documents,
                    Resource::Templates,
                    Resource::Clauses,
                    Resource::Workflows,
                ] {
                    for action in [
                        Action::Create,
                        Action::Read,
                        Action::Update,
                        Action::Delete,
                        Action::Publish,
                        Action::Approve,
                        Action::Export,
                        Action::Use,
                    ] {
                        permissions.grant(resource, action);
                    }
                }
                permissions.grant(Resource::Users, Action::Read);
                permissions.grant(Resource::Roles, Action::Read);
                permissions.grant(Resource::Analytics, Action::Read);
                permissions.grant(Resource::Analytics, Action::Export);
                permissions.grant(Resource::Audit, Action::Read);
            }
            Self::DepartmentAdmin => {
                for action in [Action::Create, Action::Read, Action::Update] {
                    permissions.grant(Resource::Users, action);
                }
                for resource in [Resource::Documents, Resource::Templates, Resource::Clauses] {
                    for action in [
                        Action::Create,
                        Action::Read,
                        Action::Update,
                        Action::Delete,
                        Action::Publish,
                        Action::Approve,
                        Action::Use,
                    ] {
                        permissions.grant(resource, action);
                    }
                }
                for action in [Action::Read, Action::Execute, Action::Use] {
                    permissions.grant(Resource::Workflows, action);
                }
                permissions.grant(Resource::Roles, Action::Read);
                permissions.grant(Resource::Analytics, Action::Read);
            }
            Self::DepartmentUser => {
                for action in [Action::Create, Action::Read, Action::Update] {
                    permissions.grant(Resource::Documents, action);
                }
                for resource in [Resource::Templates, Resource::Clauses] {
                    permissions.grant(resource, Action::Read);
                    permissions.grant(resource, Action::Use);
                }
                permissions.grant(Resource::Workflows, Action::Read);
                permissions.grant(Resource::Workflows, Action::Execute);
                permissions.grant(Resource::Analytics, Action::Read);
            }
        }

        permissions
    }

    /// Returns the description recorded when the role is seeded.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::PlatformAdministrator => {
                "Full platform administration, including system configuration"
            }
            Self::LegalAdmin => "Manages legal content and workflows across departments",
            Self::DepartmentAdmin => "Manages users and content within a department",
            Self::DepartmentUser => "Standard document work within a department",
        }
    }

    /// Returns whether the given name belongs to a seeded system role.
    #[must_use]
    pub fn is_system_name(name: &str) -> bool {
        Self::all().iter().any(|role| role.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use crate::permission::{Action, Resource};

    use super::SystemRole;

    #[test]
    fn system_role_names_are_recognized() {
        assert!(SystemRole::is_system_name("Platform Administrator"));
        assert!(SystemRole::is_system_name("Department User"));
        assert!(!SystemRole::is_system_name("platform administrator"));
        assert!(!SystemRole::is_system_name("Counsel"));
    }

    #[test]
    fn platform_administrator_holds_every_grant() {
        let permissions = SystemRole::PlatformAdministrator.default_permissions();
        for resource in Resource::all() {
            for action in Action::all() {
                assert!(permissions.allows(*resource, *action));
            }
        }
    }

    #[test]
    fn department_user_cannot_manage_roles() {
        let permissions = SystemRole::DepartmentUser.default_permissions();
        assert!(!permissions.allows(Resource::Roles, Action::Create));
        assert!(!permissions.allows(Resource::System, Action::Configure));
        assert!(permissions.allows(Resource::Documents, Action::Read));
    }
}
