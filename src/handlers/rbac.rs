// src/handlers/rbac.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        query::PageParams,
        response::ApiResponse,
    },
    config::AppState,
    handlers::message,
    middleware::{
        i18n::Locale,
        rbac::{PermRolesCreate, PermRolesDelete, PermRolesRead, PermRolesUpdate, RequirePermission},
    },
    models::rbac::{AssignRolesPayload, CreatePermissionPayload, CreateRolePayload, UpdateRolePayload},
};

// GET /api/roles
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesRead>,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .rbac_service
        .list_roles()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(message(&app_state, &locale, "role.list"), roles)))
}

// POST /api/roles
pub async fn create_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesCreate>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateRolePayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let role = app_state
        .rbac_service
        .create_role(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(message(&app_state, &locale, "role.created"), role)),
    ))
}

// PUT /api/roles/{id}
pub async fn update_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesUpdate>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateRolePayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let role = app_state
        .rbac_service
        .update_role(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(message(&app_state, &locale, "role.updated"), role)))
}

// DELETE /api/roles/{id}
pub async fn delete_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesDelete>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .rbac_service
        .delete_role(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::message_only(message(&app_state, &locale, "role.deleted"))))
}

// GET /api/permissions (o front usa para montar a tela de cargos)
pub async fn list_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesRead>,
) -> Result<impl IntoResponse, ApiError> {
    let permissions = app_state
        .rbac_service
        .list_permissions()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "permission.list"),
        permissions,
    )))
}

// POST /api/permissions
pub async fn create_permission(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesCreate>,
    WithRejection(Json(payload), _): WithRejection<Json<CreatePermissionPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let permission = app_state
        .rbac_service
        .create_permission(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            message(&app_state, &locale, "permission.created"),
            permission,
        )),
    ))
}

// POST /api/roles/assign
pub async fn assign_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesUpdate>,
    WithRejection(Json(payload), _): WithRejection<Json<AssignRolesPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let assigned = app_state
        .rbac_service
        .assign_roles(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(message(&app_state, &locale, "role.assigned"), assigned)))
}

// GET /api/users-with-roles
pub async fn users_with_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesRead>,
    WithRejection(Query(page), _): WithRejection<Query<PageParams>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .rbac_service
        .users_with_roles(page.resolve())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "role.users_with_roles"),
        users,
    )))
}
