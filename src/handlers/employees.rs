// src/handlers/employees.rs

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
        rbac::{
            PermEmployeesCreate, PermEmployeesDelete, PermEmployeesRead, PermEmployeesUpdate,
            RequirePermission,
        },
    },
    models::employee::{CreateEmployeePayload, EmployeeFilters, UpdateEmployeePayload},
};

// GET /api/employees?hr_active=1&contract_type_id=2&with_relations=1
pub async fn list_employees(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermEmployeesRead>,
    WithRejection(Query(page), _): WithRejection<Query<PageParams>, ApiError>,
    WithRejection(Query(filters), _): WithRejection<Query<EmployeeFilters>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let employees = app_state
        .employee_service
        .list(&filters, page.resolve())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "employee.list"),
        employees,
    )))
}

// GET /api/employees/{id}?with_relations=1
pub async fn get_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermEmployeesRead>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Query(filters), _): WithRejection<Query<EmployeeFilters>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let employee = app_state
        .employee_service
        .get(id, filters.with_relations.unwrap_or(false))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "employee.found"),
        employee,
    )))
}

// POST /api/employees
pub async fn create_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermEmployeesCreate>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateEmployeePayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let employee = app_state
        .employee_service
        .create(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            message(&app_state, &locale, "employee.created"),
            employee,
        )),
    ))
}

// PUT /api/employees/{id}
pub async fn update_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermEmployeesUpdate>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateEmployeePayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate_all()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let employee = app_state
        .employee_service
        .update(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "employee.updated"),
        employee,
    )))
}

// DELETE /api/employees/{id}
pub async fn delete_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermEmployeesDelete>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .employee_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::message_only(message(
        &app_state,
        &locale,
        "employee.deleted",
    ))))
}
