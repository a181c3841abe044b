use lexvault_application::CreateRoleInput;
use lexvault_core::{AppError, AppResult};
use lexvault_domain::SystemRole;
use tracing::info;

use crate::state::AppState;

/// Idempotently ensures the seeded system roles exist with their default
/// grants. Roles that already exist are left untouched, including any
/// administrator edits to their permission structures.
pub async fn run(state: &AppState) -> AppResult<()> {
    for system_role in SystemRole::all() {
        match state
            .role_lifecycle_service
            .get_role_by_name(system_role.name())
            .await
        {
            Ok(_) => {}
            Err(AppError::NotFound(_)) => {
                state
                    .role_lifecycle_service
                    .create_role(CreateRoleInput {
                        name: system_role.name().to_owned(),
                        description: Some(system_role.description().to_owned()),
                        permissions: system_role.default_permissions(),
                        is_system_role: true,
                    })
                    .await?;
                info!(role = system_role.name(), "seeded system role");
            }
            Err(error) => return Err(error),
        }
    }

    Ok(())
}
