use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::handlers::validate_request;
use crate::middlewares::auth::JwtClaims;
use crate::models::achievement::{UnlockRequest, UnlockedAchievement};
use crate::services::progress_service::ProgressService;
use crate::services::AppState;

/// POST /api/achievements/unlock — idempotent; repeats return the original
/// unlock record.
pub async fn unlock(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<UnlockRequest>,
) -> Result<Json<UnlockedAchievement>, ApiError> {
    validate_request(&req)?;

    let service = ProgressService::new(state.store.clone());
    let unlocked = service.unlock_for_client(&claims.sub, &req.code).await?;
    Ok(Json(unlocked))
}

/// GET /api/me/achievements — newest first.
pub async fn my_achievements(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<Vec<UnlockedAchievement>>, ApiError> {
    let unlocks = state.store.list_unlocks(&claims.sub).await?;
    Ok(Json(unlocks))
}
