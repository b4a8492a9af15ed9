use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::achievement::{Achievement, UnlockRecord, UnlockedAchievement};
use crate::models::lesson::{LanguageCount, Lesson, TopicCount};
use crate::models::progress::Progress;
use crate::models::user::{NewUser, User};

pub mod memory;
pub mod mongo;

/// Persistence capability handed to services explicitly instead of a shared
/// global handle. `MongoStore` backs the binary; `MemoryStore` gives the test
/// suite an isolated store per test.
///
/// Mutation discipline: every write is an atomic keyed upsert or
/// insert-if-absent. Correctness under concurrent requests rests on those
/// key conflicts, not on explicit locks.
#[async_trait]
pub trait Store: Send + Sync {
    // --- users ---

    /// Insert a new user, assigning its id. Duplicate email yields
    /// `StoreError::Conflict`.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    // --- lessons (seeded reference data) ---

    async fn insert_lesson(&self, lesson: Lesson) -> Result<(), StoreError>;

    async fn lesson_count(&self) -> Result<u64, StoreError>;

    /// List lessons in stored order, optionally filtered by exact language
    /// and/or topic (AND when both given).
    async fn list_lessons(
        &self,
        language: Option<&str>,
        topic: Option<&str>,
    ) -> Result<Vec<Lesson>, StoreError>;

    async fn get_lesson(&self, id: i64) -> Result<Option<Lesson>, StoreError>;

    async fn language_counts(&self) -> Result<Vec<LanguageCount>, StoreError>;

    async fn topic_counts(&self, language: Option<&str>) -> Result<Vec<TopicCount>, StoreError>;

    /// Case-insensitive substring match across title, summary and content.
    /// Store-native order, capped at `limit`.
    async fn search_lessons(&self, query: &str, limit: i64) -> Result<Vec<Lesson>, StoreError>;

    // --- progress ledger ---

    /// Record one scored submission: upsert the (user, lesson) progress row
    /// (overwriting `completed`/`score`, refreshing `updated_at`, leaving
    /// `started` alone) and return the user's completed-lesson count as seen
    /// after that write is durable. The count feeds the THREE_LESSONS rule,
    /// so it must never be computed from pre-upsert state.
    async fn apply_submission(
        &self,
        user_id: &str,
        lesson_id: i64,
        score: i64,
        completed: bool,
    ) -> Result<u64, StoreError>;

    /// Upsert the (user, lesson) row with `started = true`, leaving
    /// `completed`/`score` untouched (false/0 on first insert).
    async fn mark_started(&self, user_id: &str, lesson_id: i64) -> Result<(), StoreError>;

    async fn list_progress(&self, user_id: &str) -> Result<Vec<Progress>, StoreError>;

    // --- achievements ---

    /// Seed a catalog entry; no-op if the code already exists.
    async fn insert_achievement(&self, achievement: Achievement) -> Result<(), StoreError>;

    async fn get_achievement(&self, code: &str) -> Result<Option<Achievement>, StoreError>;

    /// Insert-if-absent unlock for (user, code). Returns true when the record
    /// was newly created; an existing record (and its timestamp) is left
    /// untouched.
    async fn unlock_achievement(&self, user_id: &str, code: &str) -> Result<bool, StoreError>;

    async fn get_unlock(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<Option<UnlockRecord>, StoreError>;

    /// Unlocked achievements joined with their catalog entries, newest first.
    async fn list_unlocks(&self, user_id: &str) -> Result<Vec<UnlockedAchievement>, StoreError>;

    // --- operational ---

    async fn ping(&self) -> Result<(), StoreError>;
}
