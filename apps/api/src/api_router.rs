use axum::Router;
use axum::handler::Handler;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post};
use lexvault_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/roles",
            get(handlers::access::list_roles_handler.layer(from_fn_with_state(
                app_state.clone(),
                middleware::require_roles_read,
            )))
            .post(handlers::access::create_role_handler.layer(from_fn_with_state(
                app_state.clone(),
                middleware::require_roles_create,
            ))),
        )
        .route(
            "/api/roles/by-name/{name}",
            get(handlers::access::get_role_by_name_handler.layer(from_fn_with_state(
                app_state.clone(),
                middleware::require_roles_read,
            ))),
        )
        .route(
            "/api/roles/{role_id}",
            get(handlers::access::get_role_handler.layer(from_fn_with_state(
                app_state.clone(),
                middleware::require_roles_read,
            )))
            .put(handlers::access::update_role_handler.layer(from_fn_with_state(
                app_state.clone(),
                middleware::require_roles_update,
            )))
            .delete(handlers::access::delete_role_handler.layer(from_fn_with_state(
                app_state.clone(),
                middleware::require_roles_delete,
            ))),
        )
        .route(
            "/api/roles/{role_id}/users",
            get(handlers::access::list_role_members_handler.layer(from_fn_with_state(
                app_state.clone(),
                middleware::require_roles_read,
            ))),
        )
        .route(
            "/api/role-assignments",
            post(handlers::access::assign_role_handler.layer(from_fn_with_state(
                app_state.clone(),
                middleware::require_assignment_manager,
            ))),
        )
        .route(
            "/api/users/{user_id}/roles",
            get(handlers::access::list_user_roles_handler.layer(from_fn_with_state(
                app_state.clone(),
                middleware::require_users_read,
            ))),
        )
        .route(
            "/api/users/{user_id}/roles/{role_id}",
            delete(handlers::access::unassign_role_handler.layer(from_fn_with_state(
                app_state.clone(),
                middleware::require_assignment_manager,
            ))),
        )
        .route(
            "/api/users/{user_id}/permissions",
            get(handlers::access::user_permissions_handler.layer(from_fn_with_state(
                app_state.clone(),
                middleware::require_users_read,
            ))),
        )
        .route_layer(from_fn(middleware::require_auth));

    // Context enrichment only: this group never rejects unauthenticated
    // callers.
    let context_routes = Router::new()
        .route(
            "/api/me/permissions",
            get(handlers::access::my_permissions_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::attach_permissions,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(context_routes)
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
