use std::sync::Arc;

use crate::error::ApiError;
use crate::models::lesson::{LanguageCount, Lesson, LessonDetail, LessonSummary, TopicCount};
use crate::store::Store;

/// Search results are capped; there is no ranking, matches come back in
/// store-native order.
const SEARCH_RESULT_CAP: i64 = 50;

/// Read-only catalog surface: lesson lists, aggregate counts, free-text
/// search. No mutation.
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_lessons(
        &self,
        language: Option<&str>,
        topic: Option<&str>,
    ) -> Result<Vec<LessonSummary>, ApiError> {
        let lessons = self.store.list_lessons(language, topic).await?;
        Ok(summaries(&lessons))
    }

    /// Full lesson with quizzes; correct-answer indices never leave the
    /// server (the conversion to `LessonDetail` drops them).
    pub async fn get_lesson(&self, id: i64) -> Result<LessonDetail, ApiError> {
        let lesson = self
            .store
            .get_lesson(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;
        Ok(LessonDetail::from(lesson))
    }

    pub async fn language_counts(&self) -> Result<Vec<LanguageCount>, ApiError> {
        Ok(self.store.language_counts().await?)
    }

    pub async fn topic_counts(&self, language: Option<&str>) -> Result<Vec<TopicCount>, ApiError> {
        Ok(self.store.topic_counts(language).await?)
    }

    /// Case-insensitive substring search across title, summary and content.
    /// A blank query returns an empty list rather than everything.
    pub async fn search(&self, query: &str) -> Result<Vec<LessonSummary>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let lessons = self.store.search_lessons(query, SEARCH_RESULT_CAP).await?;
        Ok(summaries(&lessons))
    }
}

fn summaries(lessons: &[Lesson]) -> Vec<LessonSummary> {
    lessons.iter().map(LessonSummary::from).collect()
}
