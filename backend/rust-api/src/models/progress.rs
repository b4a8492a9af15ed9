use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bson_datetime_as_chrono;

/// Per-(user, lesson) progress record. The composite `_id` is the uniqueness
/// mechanism: concurrent submissions race on one document key, so the store's
/// keyed upsert guarantees at most one record per pair and last-write-wins
/// for `score`/`completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    /// "{user_id}:{lesson_id}"
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub lesson_id: i64,
    pub started: bool,
    pub completed: bool,
    pub score: i64,
    #[serde(with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    pub fn key(user_id: &str, lesson_id: i64) -> String {
        format!("{}:{}", user_id, lesson_id)
    }
}

/// Entry returned by GET /api/me/progress.
#[derive(Debug, Serialize)]
pub struct ProgressEntry {
    pub lesson_id: i64,
    pub started: bool,
    pub completed: bool,
    pub score: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<Progress> for ProgressEntry {
    fn from(p: Progress) -> Self {
        ProgressEntry {
            lesson_id: p.lesson_id,
            started: p.started,
            completed: p.completed,
            score: p.score,
            updated_at: p.updated_at,
        }
    }
}

/// Body of POST /api/lessons/{id}/submit. Answers are matched positionally
/// against the lesson's quizzes; short arrays leave trailing quizzes
/// unmatched, extra entries are ignored.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub answers: Vec<i64>,
}

/// Result of scoring one submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub score: i64,
    pub total: i64,
    pub completed: bool,
}
