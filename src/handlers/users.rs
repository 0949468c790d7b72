// src/handlers/users.rs

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
        rbac::{PermUsersCreate, PermUsersDelete, PermUsersRead, PermUsersUpdate, RequirePermission},
    },
    models::users::{CreateUserPayload, UpdateUserPayload},
};

// GET /api/users
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermUsersRead>,
    WithRejection(Query(page), _): WithRejection<Query<PageParams>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .list(page.resolve())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(message(&app_state, &locale, "user.list"), users)))
}

// GET /api/users/{id}
pub async fn get_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermUsersRead>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .user_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(message(&app_state, &locale, "user.found"), user)))
}

// POST /api/users
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermUsersCreate>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateUserPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .user_service
        .create(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(message(&app_state, &locale, "user.created"), user)),
    ))
}

// PUT /api/users/{id}
pub async fn update_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermUsersUpdate>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateUserPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .user_service
        .update(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(message(&app_state, &locale, "user.updated"), user)))
}

// DELETE /api/users/{id}
pub async fn delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermUsersDelete>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .user_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::message_only(message(&app_state, &locale, "user.deleted"))))
}

// GET /api/users/{id}/login-locations
pub async fn login_locations(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermUsersRead>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Query(page), _): WithRejection<Query<PageParams>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let locations = app_state
        .user_service
        .login_locations(id, page.resolve())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "user.login_locations"),
        locations,
    )))
}
