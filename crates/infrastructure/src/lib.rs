//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_assignment_repository;
mod in_memory_role_repository;
mod in_memory_user_directory;
mod postgres_assignment_repository;
mod postgres_role_repository;
mod postgres_user_directory;

pub use in_memory_assignment_repository::InMemoryAssignmentRepository;
pub use in_memory_role_repository::InMemoryRoleRepository;
pub use in_memory_user_directory::InMemoryUserDirectory;
pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_user_directory::PostgresUserDirectory;
