//! Application services and ports for the Lexvault access-control core.

#![forbid(unsafe_code)]

mod access_ports;
mod permission_resolver;
mod role_lifecycle_service;

pub use access_ports::{
    AssignmentRepository, AssignmentUpdate, AssignmentWithRole, AssignmentWithUser, NewAssignment,
    NewRole, RoleRepository, RoleUpdate, UserDirectory, UserSummary,
};
pub use permission_resolver::PermissionResolver;
pub use role_lifecycle_service::{
    AssignRoleInput, CreateRoleInput, RoleLifecycleService, UpdateRoleInput,
};
