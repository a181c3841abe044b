//! Repository and directory ports backing the access-control services.

mod assignments;
mod roles;
mod users;

pub use assignments::{
    AssignmentRepository, AssignmentUpdate, AssignmentWithRole, AssignmentWithUser, NewAssignment,
};
pub use roles::{NewRole, RoleRepository, RoleUpdate};
pub use users::{UserDirectory, UserSummary};
