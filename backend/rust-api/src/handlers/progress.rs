use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::handlers::parse_lesson_id;
use crate::middlewares::auth::JwtClaims;
use crate::models::progress::{ProgressEntry, SubmitRequest, SubmitResponse};
use crate::services::progress_service::ProgressService;
use crate::services::AppState;

/// POST /api/lessons/{id}/start
pub async fn start_lesson(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let lesson_id = parse_lesson_id(&raw_id)?;
    let service = ProgressService::new(state.store.clone());
    service.start(&claims.sub, lesson_id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// POST /api/lessons/{id}/submit
pub async fn submit_lesson(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(raw_id): Path<String>,
    AppJson(req): AppJson<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let lesson_id = parse_lesson_id(&raw_id)?;
    let service = ProgressService::new(state.store.clone());
    let response = service.submit(&claims.sub, lesson_id, &req.answers).await?;
    Ok(Json(response))
}

/// GET /api/me/progress
pub async fn my_progress(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<Vec<ProgressEntry>>, ApiError> {
    let progress = state.store.list_progress(&claims.sub).await?;
    Ok(Json(progress.into_iter().map(ProgressEntry::from).collect()))
}
