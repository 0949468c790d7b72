// src/handlers/organization.rs

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
    middleware::{i18n::Locale, rbac::*},
    models::organization::{
        CreateDepartmentPayload, CreateOrgStructurePayload, DepartmentFilters, OrgStructureFilters,
        UpdateAccessPayload, UpdateDepartmentPayload, UpdateOrgStructurePayload,
    },
};

// =============================================================================
//  DEPARTAMENTOS
// =============================================================================

// GET /api/departments?active=1&with_structures=1
pub async fn list_departments(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermDepartmentsRead>,
    WithRejection(Query(page), _): WithRejection<Query<PageParams>, ApiError>,
    WithRejection(Query(filters), _): WithRejection<Query<DepartmentFilters>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let departments = app_state
        .organization_service
        .list_departments(&filters, page.resolve())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "department.list"),
        departments,
    )))
}

// GET /api/departments/{id}?with_structures=1
pub async fn get_department(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermDepartmentsRead>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Query(filters), _): WithRejection<Query<DepartmentFilters>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let department = app_state
        .organization_service
        .get_department(id, filters.with_structures.unwrap_or(false))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "department.found"),
        department,
    )))
}

// POST /api/departments
pub async fn create_department(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermDepartmentsCreate>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateDepartmentPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let department = app_state
        .organization_service
        .create_department(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            message(&app_state, &locale, "department.created"),
            department,
        )),
    ))
}

// PUT /api/departments/{id}
pub async fn update_department(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermDepartmentsUpdate>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateDepartmentPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let department = app_state
        .organization_service
        .update_department(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "department.updated"),
        department,
    )))
}

// DELETE /api/departments/{id}
pub async fn delete_department(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermDepartmentsDelete>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .organization_service
        .delete_department(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::message_only(message(
        &app_state,
        &locale,
        "department.deleted",
    ))))
}

// =============================================================================
//  ESTRUTURA ORGANIZACIONAL
// =============================================================================

// GET /api/org-structures?active=1&department_id=3&with_relations=1
pub async fn list_org_structures(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermStructuresRead>,
    WithRejection(Query(page), _): WithRejection<Query<PageParams>, ApiError>,
    WithRejection(Query(filters), _): WithRejection<Query<OrgStructureFilters>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let org_structures = app_state
        .organization_service
        .list_org_structures(&filters, page.resolve())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "org_structure.list"),
        org_structures,
    )))
}

// GET /api/org-structures/{id}?with_relations=1
pub async fn get_org_structure(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermStructuresRead>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Query(filters), _): WithRejection<Query<OrgStructureFilters>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let org_structure = app_state
        .organization_service
        .get_org_structure(id, filters.with_relations.unwrap_or(false))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "org_structure.found"),
        org_structure,
    )))
}

// POST /api/org-structures
pub async fn create_org_structure(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermStructuresCreate>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateOrgStructurePayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let org_structure = app_state
        .organization_service
        .create_org_structure(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            message(&app_state, &locale, "org_structure.created"),
            org_structure,
        )),
    ))
}

// PUT /api/org-structures/{id}
pub async fn update_org_structure(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermStructuresUpdate>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateOrgStructurePayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let org_structure = app_state
        .organization_service
        .update_org_structure(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "org_structure.updated"),
        org_structure,
    )))
}

// PUT /api/org-structures/{id}/access
pub async fn update_access(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermStructuresUpdate>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateAccessPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let org_structure = app_state
        .organization_service
        .update_access(id, &payload.access_departments)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "org_structure.access_updated"),
        org_structure,
    )))
}

// GET /api/org-structures/{id}/badge-colors
pub async fn badge_colors(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermStructuresRead>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let colors = app_state
        .organization_service
        .badge_colors(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "org_structure.badge_colors"),
        colors,
    )))
}

// DELETE /api/org-structures/{id}
pub async fn delete_org_structure(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermStructuresDelete>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .organization_service
        .delete_org_structure(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::message_only(message(
        &app_state,
        &locale,
        "org_structure.deleted",
    ))))
}
