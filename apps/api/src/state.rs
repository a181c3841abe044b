use lexvault_application::{PermissionResolver, RoleLifecycleService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub role_lifecycle_service: RoleLifecycleService,
    pub permission_resolver: PermissionResolver,
    pub frontend_url: String,
}
