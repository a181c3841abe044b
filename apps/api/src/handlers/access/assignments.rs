use super::*;

pub async fn assign_role_handler(
    State(state): State<AppState>,
    payload: Result<Json<AssignRoleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AssignmentResponse>>)> {
    let payload = envelope_json(payload)?;
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::Validation("user_id is required".to_owned()))?;
    let role_id = payload
        .role_id
        .ok_or_else(|| AppError::Validation("role_id is required".to_owned()))?;

    let assignment = state
        .role_lifecycle_service
        .assign_role(AssignRoleInput {
            user_id: UserId::from_uuid(user_id),
            role_id: RoleId::from_uuid(role_id),
            assigned_by: payload.assigned_by.map(UserId::from_uuid),
            expires_at: payload.expires_at,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(AssignmentResponse::from(assignment))),
    ))
}

pub async fn unassign_role_handler(
    State(state): State<AppState>,
    Path((user_id, role_id)): Path<(uuid::Uuid, uuid::Uuid)>,
    Query(query): Query<RemoveRoleQuery>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .role_lifecycle_service
        .remove_role(
            UserId::from_uuid(user_id),
            RoleId::from_uuid(role_id),
            query.hard,
        )
        .await?;

    Ok(Json(ApiResponse::message("role unassigned")))
}

pub async fn list_user_roles_handler(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
    Query(query): Query<IncludeInactiveQuery>,
) -> ApiResult<Json<ApiResponse<Vec<UserRoleResponse>>>> {
    let entries: Vec<UserRoleResponse> = state
        .role_lifecycle_service
        .list_user_assignments(UserId::from_uuid(user_id), query.include_inactive)
        .await?
        .into_iter()
        .map(UserRoleResponse::from)
        .collect();

    let count = entries.len();
    Ok(Json(ApiResponse::list(entries, count)))
}

pub async fn list_role_members_handler(
    State(state): State<AppState>,
    Path(role_id): Path<uuid::Uuid>,
    Query(query): Query<IncludeInactiveQuery>,
) -> ApiResult<Json<ApiResponse<Vec<RoleMemberResponse>>>> {
    let members: Vec<RoleMemberResponse> = state
        .role_lifecycle_service
        .list_role_members(RoleId::from_uuid(role_id), query.include_inactive)
        .await?
        .into_iter()
        .map(RoleMemberResponse::from)
        .collect();

    let count = members.len();
    Ok(Json(ApiResponse::list(members, count)))
}

pub async fn user_permissions_handler(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
) -> ApiResult<Json<ApiResponse<MergedPermissionsResponse>>> {
    let merged = state
        .permission_resolver
        .effective_permissions(UserId::from_uuid(user_id))
        .await?;

    Ok(Json(ApiResponse::data(MergedPermissionsResponse {
        permissions: merged.to_transport(),
    })))
}

/// Returns the permissions attached by the non-blocking context middleware.
///
/// Unauthenticated callers get an empty structure rather than a rejection.
pub async fn my_permissions_handler(
    permissions: Option<Extension<PermissionSet>>,
) -> ApiResult<Json<ApiResponse<MergedPermissionsResponse>>> {
    let merged = permissions.map(|Extension(value)| value).unwrap_or_default();

    Ok(Json(ApiResponse::data(MergedPermissionsResponse {
        permissions: merged.to_transport(),
    })))
}
