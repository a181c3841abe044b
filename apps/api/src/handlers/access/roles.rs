use super::*;

pub async fn list_roles_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<RoleResponse>>>> {
    let roles: Vec<RoleResponse> = state
        .role_lifecycle_service
        .list_roles()
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    let count = roles.len();
    Ok(Json(ApiResponse::list(roles, count)))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Path(role_id): Path<uuid::Uuid>,
) -> ApiResult<Json<ApiResponse<RoleResponse>>> {
    let role = state
        .role_lifecycle_service
        .get_role(RoleId::from_uuid(role_id))
        .await?;

    Ok(Json(ApiResponse::data(RoleResponse::from(role))))
}

pub async fn get_role_by_name_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ApiResponse<RoleResponse>>> {
    let role = state
        .role_lifecycle_service
        .get_role_by_name(name.as_str())
        .await?;

    Ok(Json(ApiResponse::data(RoleResponse::from(role))))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<RoleResponse>>)> {
    let payload = envelope_json(payload)?;
    let name = payload
        .name
        .ok_or_else(|| AppError::Validation("name is required".to_owned()))?;
    let permissions = payload
        .permissions
        .ok_or_else(|| AppError::Validation("permissions is required".to_owned()))?;
    let permissions = PermissionSet::from_transport(&permissions)?;

    let role = state
        .role_lifecycle_service
        .create_role(CreateRoleInput {
            name,
            description: payload.description,
            permissions,
            is_system_role: false,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(RoleResponse::from(role))),
    ))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Path(role_id): Path<uuid::Uuid>,
    payload: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<RoleResponse>>> {
    let payload = envelope_json(payload)?;
    let permissions = payload
        .permissions
        .as_ref()
        .map(PermissionSet::from_transport)
        .transpose()?;

    let role = state
        .role_lifecycle_service
        .update_role(
            RoleId::from_uuid(role_id),
            UpdateRoleInput {
                name: payload.name,
                description: payload.description,
                permissions,
            },
        )
        .await?;

    Ok(Json(ApiResponse::data(RoleResponse::from(role))))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Path(role_id): Path<uuid::Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    state
        .role_lifecycle_service
        .delete_role(RoleId::from_uuid(role_id))
        .await?;

    Ok(Json(ApiResponse::message("role deleted")))
}
