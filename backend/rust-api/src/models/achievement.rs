use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::bson_datetime_as_chrono;

/// Achievement codes unlocked by the submission workflow.
pub const FIRST_LESSON_COMPLETE: &str = "FIRST_LESSON_COMPLETE";
pub const PERFECT_SCORE: &str = "PERFECT_SCORE";
pub const THREE_LESSONS: &str = "THREE_LESSONS";

/// Catalog entry, keyed by code. Seeded once; the catalog is closed, clients
/// can never mint new entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    #[serde(rename = "_id")]
    pub code: String,
    pub title: String,
    pub description: String,
}

/// Per-(user, achievement) unlock record. Composite `_id` makes unlocking
/// idempotent: insert-if-absent on the key, the original timestamp is never
/// overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockRecord {
    /// "{user_id}:{code}"
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub code: String,
    #[serde(with = "bson_datetime_as_chrono")]
    pub unlocked_at: DateTime<Utc>,
}

impl UnlockRecord {
    pub fn key(user_id: &str, code: &str) -> String {
        format!("{}:{}", user_id, code)
    }
}

/// Entry returned by GET /api/me/achievements and POST /api/achievements/unlock.
#[derive(Debug, Serialize)]
pub struct UnlockedAchievement {
    pub code: String,
    pub title: String,
    pub description: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Body of POST /api/achievements/unlock. `title`/`description` are accepted
/// for wire compatibility with older clients but ignored: the seeded catalog
/// is authoritative and unknown codes are rejected.
#[derive(Debug, Deserialize, Validate)]
pub struct UnlockRequest {
    #[validate(length(min = 1, max = 64, message = "Achievement code is required"))]
    pub code: String,
    pub title: Option<String>,
    pub description: Option<String>,
}
