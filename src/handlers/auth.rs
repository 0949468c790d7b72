// src/handlers/auth.rs

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::{
    extract::WithRejection,
    headers::{HeaderMapExt, UserAgent},
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::ApiResponse,
    },
    config::AppState,
    handlers::message,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{LoginContext, LoginUserPayload, RegisterUserPayload},
};

// IP do cliente: primeiro item do X-Forwarded-For, senão X-Real-IP
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
}

fn login_context(headers: &HeaderMap) -> LoginContext {
    LoginContext {
        ip_address: client_ip(headers),
        user_agent: headers
            .typed_get::<UserAgent>()
            .map(|ua| ua.as_str().to_string()),
    }
}

// POST /api/register
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterUserPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .auth_service
        .register_user(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(message(&app_state, &locale, "auth.registered"), response)),
    ))
}

// POST /api/login
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
    WithRejection(Json(payload), _): WithRejection<Json<LoginUserPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .auth_service
        .login_user(&payload, login_context(&headers))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "auth.logged_in"),
        response,
    )))
}

// POST /api/logout
pub async fn logout(
    State(app_state): State<AppState>,
    locale: Locale,
    current: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .auth_service
        .logout(&current)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::message_only(message(
        &app_state,
        &locale,
        "auth.logged_out",
    ))))
}

// GET /api/profile
pub async fn profile(
    State(app_state): State<AppState>,
    locale: Locale,
    current: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = app_state
        .auth_service
        .profile(current.user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::new(
        message(&app_state, &locale, "auth.profile"),
        profile,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_wins_over_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn real_ip_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.9"));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn user_agent_goes_into_the_context() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("curl/8.5.0"));
        let context = login_context(&headers);
        assert_eq!(context.user_agent.as_deref(), Some("curl/8.5.0"));
        assert!(context.ip_address.is_none());
    }
}
