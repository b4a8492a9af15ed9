use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::handlers::validate_request;
use crate::middlewares::auth::JwtService;
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest};
use crate::services::auth_service::AuthService;
use crate::services::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    validate_request(&req)?;

    let service = AuthService::new(
        state.store.clone(),
        JwtService::new(&state.config.jwt_secret),
    );
    let response = service.register(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    validate_request(&req)?;

    let service = AuthService::new(
        state.store.clone(),
        JwtService::new(&state.config.jwt_secret),
    );
    let response = service.login(req).await?;
    Ok(Json(response))
}
