use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use lexvault_core::{AppError, UserIdentity};
use lexvault_domain::{Action, Resource};
use tower_sessions::Session;

use crate::auth::SESSION_USER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

/// Role names allowed to manage user-role assignments.
pub const ASSIGNMENT_MANAGER_ROLES: &[&str] = &["Platform Administrator", "Legal Admin"];

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if let Some(fetch_site) = headers.get("sec-fetch-site") {
            if fetch_site == HeaderValue::from_static("cross-site") {
                return Err(AppError::Unauthorized("cross-site request blocked".to_owned()).into());
            }
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        let allowed_origin = state.frontend_url;
        let origin_is_allowed = origin == allowed_origin;
        let referer_is_allowed = referer.starts_with(&allowed_origin);

        if !origin_is_allowed && !referer_is_allowed {
            return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

/// Blocking permission guard: admits the request only when the actor holds
/// the registered `resource:action` grant.
///
/// Resolution failures propagate as 500; the guard never converts them into
/// an allow or a deny.
pub async fn require_permission(
    state: &AppState,
    resource: Resource,
    action: Action,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = current_identity(&request)?;

    let allowed = state
        .permission_resolver
        .has_permission(identity.user_id(), resource, action)
        .await?;

    if !allowed {
        return Err(AppError::Forbidden(format!(
            "missing permission '{}:{}'",
            resource.as_str(),
            action.as_str()
        ))
        .into());
    }

    Ok(next.run(request).await)
}

/// Blocking role guard: admits the request only when the actor holds one of
/// the registered role names.
pub async fn require_role(
    state: &AppState,
    allowed_role_names: &[&str],
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = current_identity(&request)?;

    let allowed = state
        .permission_resolver
        .has_any_role(identity.user_id(), allowed_role_names)
        .await?;

    if !allowed {
        return Err(AppError::Forbidden(format!(
            "requires one of the roles: {}",
            allowed_role_names.join(", ")
        ))
        .into());
    }

    Ok(next.run(request).await)
}

/// Non-blocking context enrichment: computes the actor's merged permission
/// structure and attaches it to the request.
///
/// Never rejects. A missing session identity or a resolution failure leaves
/// the request without attached permissions and lets it proceed; only the
/// guard's own lookup errors are swallowed here.
pub async fn attach_permissions(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .unwrap_or_default();

    if let Some(identity) = identity {
        match state
            .permission_resolver
            .effective_permissions(identity.user_id())
            .await
        {
            Ok(permissions) => {
                request.extensions_mut().insert(permissions);
                request.extensions_mut().insert(identity);
            }
            Err(error) => {
                tracing::warn!(%error, "failed to resolve permissions for request context");
            }
        }
    }

    next.run(request).await
}

// Registration-time wrappers binding guard parameters to route groups.

pub async fn require_roles_read(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    require_permission(&state, Resource::Roles, Action::Read, request, next).await
}

pub async fn require_roles_create(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    require_permission(&state, Resource::Roles, Action::Create, request, next).await
}

pub async fn require_roles_update(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    require_permission(&state, Resource::Roles, Action::Update, request, next).await
}

pub async fn require_roles_delete(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    require_permission(&state, Resource::Roles, Action::Delete, request, next).await
}

pub async fn require_users_read(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    require_permission(&state, Resource::Users, Action::Read, request, next).await
}

pub async fn require_assignment_manager(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    require_role(&state, ASSIGNMENT_MANAGER_ROLES, request, next).await
}

fn current_identity(request: &Request) -> Result<UserIdentity, AppError> {
    request
        .extensions()
        .get::<UserIdentity>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
