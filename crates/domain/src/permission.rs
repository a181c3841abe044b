use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use lexvault_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Protected resource surfaces known to the platform.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// User accounts owned by the identity subsystem.
    Users,
    /// Role definitions and assignments.
    Roles,
    /// Legal documents in the repository.
    Documents,
    /// Reusable document templates.
    Templates,
    /// Clause library entries.
    Clauses,
    /// Review and approval workflows.
    Workflows,
    /// Reporting and analytics views.
    Analytics,
    /// Platform configuration surfaces.
    System,
    /// Audit trail entries.
    Audit,
}

impl Resource {
    /// Returns a stable storage value for this resource.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Documents => "documents",
            Self::Templates => "templates",
            Self::Clauses => "clauses",
            Self::Workflows => "workflows",
            Self::Analytics => "analytics",
            Self::System => "system",
            Self::Audit => "audit",
        }
    }

    /// Returns all known resources.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Resource] = &[
            Resource::Users,
            Resource::Roles,
            Resource::Documents,
            Resource::Templates,
            Resource::Clauses,
            Resource::Workflows,
            Resource::Analytics,
            Resource::System,
            Resource::Audit,
        ];

        ALL
    }
}

impl FromStr for Resource {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "users" => Ok(Self::Users),
            "roles" => Ok(Self::Roles),
            "documents" => Ok(Self::Documents),
            "templates" => Ok(Self::Templates),
            "clauses" => Ok(Self::Clauses),
            "workflows" => Ok(Self::Workflows),
            "analytics" => Ok(Self::Analytics),
            "system" => Ok(Self::System),
            "audit" => Ok(Self::Audit),
            _ => Err(AppError::Validation(format!(
                "unknown resource value '{value}'"
            ))),
        }
    }
}

/// Actions that can be granted on a resource.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create new records.
    Create,
    /// Read existing records.
    Read,
    /// Modify existing records.
    Update,
    /// Remove records.
    Delete,
    /// Publish drafts to a visible state.
    Publish,
    /// Approve items in a review step.
    Approve,
    /// Execute a workflow or job.
    Execute,
    /// Export data out of the platform.
    Export,
    /// Change configuration.
    Configure,
    /// Take backups.
    Backup,
    /// Restore from backups.
    Restore,
    /// Use an item without modifying it (templates, clauses).
    Use,
}

impl Action {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Publish => "publish",
            Self::Approve => "approve",
            Self::Execute => "execute",
            Self::Export => "export",
            Self::Configure => "configure",
            Self::Backup => "backup",
            Self::Restore => "restore",
            Self::Use => "use",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Action] = &[
            Action::Create,
            Action::Read,
            Action::Update,
            Action::Delete,
            Action::Publish,
            Action::Approve,
            Action::Execute,
            Action::Export,
            Action::Configure,
            Action::Backup,
            Action::Restore,
            Action::Use,
        ];

        ALL
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "publish" => Ok(Self::Publish),
            "approve" => Ok(Self::Approve),
            "execute" => Ok(Self::Execute),
            "export" => Ok(Self::Export),
            "configure" => Ok(Self::Configure),
            "backup" => Ok(Self::Backup),
            "restore" => Ok(Self::Restore),
            "use" => Ok(Self::Use),
            _ => Err(AppError::Validation(format!(
                "unknown action value '{value}'"
            ))),
        }
    }
}

/// Mapping from resource to the set of granted actions.
///
/// The map is the unit of permission storage on a role and the unit of
/// merging across a user's roles. Action sets are deduplicated and ordered
/// structurally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeMap<Resource, BTreeSet<Action>>);

impl PermissionSet {
    /// Creates an empty permission set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Parses a transport mapping of resource names to action-name lists.
    ///
    /// Fails with a validation error naming the first unknown resource or
    /// action encountered. Duplicate actions collapse into the set.
    pub fn from_transport(entries: &BTreeMap<String, Vec<String>>) -> AppResult<Self> {
        let mut grants = BTreeMap::new();

        for (resource_value, action_values) in entries {
            let resource = Resource::from_str(resource_value)?;
            let actions = action_values
                .iter()
                .map(|value| Action::from_str(value))
                .collect::<AppResult<BTreeSet<Action>>>()?;

            grants.insert(resource, actions);
        }

        Ok(Self(grants))
    }

    /// Returns the transport mapping of resource names to action-name lists.
    #[must_use]
    pub fn to_transport(&self) -> BTreeMap<String, Vec<String>> {
        self.0
            .iter()
            .map(|(resource, actions)| {
                (
                    resource.as_str().to_owned(),
                    actions.iter().map(|action| action.as_str().to_owned()).collect(),
                )
            })
            .collect()
    }

    /// Adds a single grant.
    pub fn grant(&mut self, resource: Resource, action: Action) {
        self.0.entry(resource).or_default().insert(action);
    }

    /// Returns whether the set grants the action on the resource.
    #[must_use]
    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.0
            .get(&resource)
            .is_some_and(|actions| actions.contains(&action))
    }

    /// Unions another permission set into this one.
    ///
    /// Merging is strictly additive: a grant present in either input is
    /// present in the result.
    pub fn merge(&mut self, other: &PermissionSet) {
        for (resource, actions) in &other.0 {
            self.0.entry(*resource).or_default().extend(actions.iter().copied());
        }
    }

    /// Returns the granted actions for a resource, if any.
    #[must_use]
    pub fn actions_for(&self, resource: Resource) -> Option<&BTreeSet<Action>> {
        self.0.get(&resource)
    }

    /// Returns whether the set carries no grants at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }

    /// Iterates over resources and their granted action sets.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, &BTreeSet<Action>)> {
        self.0.iter().map(|(resource, actions)| (*resource, actions))
    }
}
