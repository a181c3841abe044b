//! Transport payloads and their conversions to and from domain types.

mod access;

pub use access::{
    AssignRoleRequest, AssignmentResponse, CreateRoleRequest, IncludeInactiveQuery,
    MergedPermissionsResponse, RemoveRoleQuery, RoleMemberResponse, RoleResponse,
    UpdateRoleRequest, UserRoleResponse,
};
