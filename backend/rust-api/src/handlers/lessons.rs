use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::handlers::parse_lesson_id;
use crate::models::lesson::{
    LanguageCount, LessonDetail, LessonSummary, ListLessonsQuery, SearchQuery, TopicCount,
    TopicsQuery,
};
use crate::services::catalog_service::CatalogService;
use crate::services::AppState;

/// GET /api/lessons — optionally filtered by language and/or topic.
pub async fn list_lessons(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLessonsQuery>,
) -> Result<Json<Vec<LessonSummary>>, ApiError> {
    let service = CatalogService::new(state.store.clone());
    let lessons = service
        .list_lessons(query.language.as_deref(), query.topic.as_deref())
        .await?;
    Ok(Json(lessons))
}

/// GET /api/lessons/{id}
pub async fn get_lesson(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<LessonDetail>, ApiError> {
    let id = parse_lesson_id(&raw_id)?;
    let service = CatalogService::new(state.store.clone());
    let lesson = service.get_lesson(id).await?;
    Ok(Json(lesson))
}

/// GET /api/catalog/languages
pub async fn language_counts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LanguageCount>>, ApiError> {
    let service = CatalogService::new(state.store.clone());
    Ok(Json(service.language_counts().await?))
}

/// GET /api/catalog/topics — optionally scoped to one language.
pub async fn topic_counts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopicsQuery>,
) -> Result<Json<Vec<TopicCount>>, ApiError> {
    let service = CatalogService::new(state.store.clone());
    Ok(Json(service.topic_counts(query.language.as_deref()).await?))
}

/// GET /api/search?q=...
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<LessonSummary>>, ApiError> {
    let service = CatalogService::new(state.store.clone());
    let results = service.search(query.q.as_deref().unwrap_or("")).await?;
    Ok(Json(results))
}
