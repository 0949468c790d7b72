// src/handlers/catalog.rs

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
    models::catalog::{
        ActiveFilter, CostCenterFilters, CreateColorPayload, CreateContractTypePayload,
        CreateCostCenterPayload, CreateFarmPayload, UpdateColorPayload, UpdateContractTypePayload,
        UpdateCostCenterPayload, UpdateFarmPayload,
    },
};

// =============================================================================
//  CORES
// =============================================================================

// GET /api/colors
pub async fn list_colors(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermColorsRead>,
    WithRejection(Query(page), _): WithRejection<Query<PageParams>, ApiError>,
    WithRejection(Query(filters), _): WithRejection<Query<ActiveFilter>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let colors = app_state
        .catalog_service
        .list_colors(&filters, page.resolve())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(message(&app_state, &locale, "color.list"), colors)))
}

// GET /api/colors/{id}
pub async fn get_color(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermColorsRead>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let color = app_state
        .catalog_service
        .get_color(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(message(&app_state, &locale, "color.found"), color)))
}

// POST /api/colors
pub async fn create_color(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermColorsCreate>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateColorPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let color = app_state
        .catalog_service
        .create_color(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(message(&app_state, &locale, "color.created"), color)),
    ))
}

// PUT /api/colors/{id}
pub async fn update_color(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermColorsUpdate>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateColorPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let color = app_state
        .catalog_service
        .update_color(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(message(&app_state, &locale, "color.updated"), color)))
}

// DELETE /api/colors/{id}
pub async fn delete_color(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermColorsDelete>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .catalog_service
        .delete_color(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::message_only(message(&app_state, &locale, "color.deleted"))))
}

// =============================================================================
//  FINCAS
// =============================================================================

// GET /api/farms
pub async fn list_farms(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermFarmsRead>,
    WithRejection(Query(page), _): WithRejection<Query<PageParams>, ApiError>,
    WithRejection(Query(filters), _): WithRejection<Query<ActiveFilter>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let farms = app_state
        .catalog_service
        .list_farms(&filters, page.resolve())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(message(&app_state, &locale, "farm.list"), farms)))
}

// GET /api/farms/{id}
pub async fn get_farm(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermFarmsRead>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let farm = app_state
        .catalog_service
        .get_farm(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(message(&app_state, &locale, "farm.found"), farm)))
}

// POST /api/farms
pub async fn create_farm(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermFarmsCreate>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateFarmPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let farm = app_state
        .catalog_service
        .create_farm(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(message(&app_state, &locale, "farm.created"), farm)),
    ))
}

// PUT /api/farms/{id}
pub async fn update_farm(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermFarmsUpdate>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateFarmPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let farm = app_state
        .catalog_service
        .update_farm(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(message(&app_state, &locale, "farm.updated"), farm)))
}

// DELETE /api/farms/{id}
pub async fn delete_farm(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermFarmsDelete>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .catalog_service
        .delete_farm(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::message_only(message(&app_state, &locale, "farm.deleted"))))
}

// =============================================================================
//  TIPOS DE CONTRATO
// =============================================================================

// GET /api/contract-types
pub async fn list_contract_types(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermContractTypesRead>,
    WithRejection(Query(page), _): WithRejection<Query<PageParams>, ApiError>,
    WithRejection(Query(filters), _): WithRejection<Query<ActiveFilter>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let contract_types = app_state
        .catalog_service
        .list_contract_types(&filters, page.resolve())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "contract_type.list"),
        contract_types,
    )))
}

// GET /api/contract-types/{id}
pub async fn get_contract_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermContractTypesRead>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let contract_type = app_state
        .catalog_service
        .get_contract_type(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "contract_type.found"),
        contract_type,
    )))
}

// POST /api/contract-types
pub async fn create_contract_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermContractTypesCreate>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateContractTypePayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let contract_type = app_state
        .catalog_service
        .create_contract_type(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            message(&app_state, &locale, "contract_type.created"),
            contract_type,
        )),
    ))
}

// PUT /api/contract-types/{id}
pub async fn update_contract_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermContractTypesUpdate>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateContractTypePayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let contract_type = app_state
        .catalog_service
        .update_contract_type(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "contract_type.updated"),
        contract_type,
    )))
}

// DELETE /api/contract-types/{id}
pub async fn delete_contract_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermContractTypesDelete>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .catalog_service
        .delete_contract_type(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::message_only(message(
        &app_state,
        &locale,
        "contract_type.deleted",
    ))))
}

// =============================================================================
//  CENTROS DE CUSTO
// =============================================================================

// GET /api/cost-centers
pub async fn list_cost_centers(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCostCentersRead>,
    WithRejection(Query(page), _): WithRejection<Query<PageParams>, ApiError>,
    WithRejection(Query(filters), _): WithRejection<Query<CostCenterFilters>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let cost_centers = app_state
        .catalog_service
        .list_cost_centers(&filters, page.resolve())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "cost_center.list"),
        cost_centers,
    )))
}

// GET /api/cost-centers/{id}
pub async fn get_cost_center(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCostCentersRead>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let cost_center = app_state
        .catalog_service
        .get_cost_center(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "cost_center.found"),
        cost_center,
    )))
}

// POST /api/cost-centers
pub async fn create_cost_center(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCostCentersCreate>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateCostCenterPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let cost_center = app_state
        .catalog_service
        .create_cost_center(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            message(&app_state, &locale, "cost_center.created"),
            cost_center,
        )),
    ))
}

// PUT /api/cost-centers/{id}
pub async fn update_cost_center(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCostCentersUpdate>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateCostCenterPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate_all()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let cost_center = app_state
        .catalog_service
        .update_cost_center(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "cost_center.updated"),
        cost_center,
    )))
}

// DELETE /api/cost-centers/{id}
pub async fn delete_cost_center(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCostCentersDelete>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .catalog_service
        .delete_cost_center(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::message_only(message(
        &app_state,
        &locale,
        "cost_center.deleted",
    ))))
}
