use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use lexvault_application::{AssignRoleInput, CreateRoleInput, UpdateRoleInput};
use lexvault_core::{AppError, UserId};
use lexvault_domain::{PermissionSet, RoleId};

use crate::dto::{
    AssignRoleRequest, AssignmentResponse, CreateRoleRequest, IncludeInactiveQuery,
    MergedPermissionsResponse, RemoveRoleQuery, RoleMemberResponse, RoleResponse,
    UpdateRoleRequest, UserRoleResponse,
};
use crate::error::{ApiResponse, ApiResult};
use crate::state::AppState;

mod assignments;
mod roles;

pub use assignments::{
    assign_role_handler, list_role_members_handler, list_user_roles_handler,
    my_permissions_handler, unassign_role_handler, user_permissions_handler,
};
pub use roles::{
    create_role_handler, delete_role_handler, get_role_by_name_handler, get_role_handler,
    list_roles_handler, update_role_handler,
};

// Malformed bodies surface through the envelope as 400s instead of the
// extractor's default rejection.
fn envelope_json<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(AppError::Validation(rejection.body_text()).into()),
    }
}
