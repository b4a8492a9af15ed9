use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use uuid::Uuid;

use super::Store;
use crate::error::StoreError;
use crate::models::achievement::{Achievement, UnlockRecord, UnlockedAchievement};
use crate::models::lesson::{LanguageCount, Lesson, TopicCount};
use crate::models::progress::Progress;
use crate::models::user::{NewUser, User};

/// In-process store used by the test suite: one mutex over plain maps, so
/// every trait method is atomic and each test gets an isolated world.
/// `apply_submission` holds the lock across upsert and completed-count,
/// making the submission sequence a true unit here.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    lessons: BTreeMap<i64, Lesson>,
    progress: HashMap<String, Progress>,
    achievements: BTreeMap<String, Achievement>,
    unlocks: HashMap<String, UnlockRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: user.email,
            password_hash: user.password_hash,
            display_name: user.display_name,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_lesson(&self, lesson: Lesson) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.lessons.contains_key(&lesson.id) {
            return Err(StoreError::Conflict);
        }
        inner.lessons.insert(lesson.id, lesson);
        Ok(())
    }

    async fn lesson_count(&self) -> Result<u64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.lessons.len() as u64)
    }

    async fn list_lessons(
        &self,
        language: Option<&str>,
        topic: Option<&str>,
    ) -> Result<Vec<Lesson>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .lessons
            .values()
            .filter(|l| language.map_or(true, |lang| l.language == lang))
            .filter(|l| topic.map_or(true, |t| l.topic == t))
            .cloned()
            .collect())
    }

    async fn get_lesson(&self, id: i64) -> Result<Option<Lesson>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.lessons.get(&id).cloned())
    }

    async fn language_counts(&self) -> Result<Vec<LanguageCount>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for lesson in inner.lessons.values() {
            *counts.entry(lesson.language.clone()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(language, count)| LanguageCount { language, count })
            .collect())
    }

    async fn topic_counts(&self, language: Option<&str>) -> Result<Vec<TopicCount>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for lesson in inner.lessons.values() {
            if language.map_or(true, |lang| lesson.language == lang) {
                *counts.entry(lesson.topic.clone()).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(topic, count)| TopicCount { topic, count })
            .collect())
    }

    async fn search_lessons(&self, query: &str, limit: i64) -> Result<Vec<Lesson>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let needle = query.to_lowercase();
        Ok(inner
            .lessons
            .values()
            .filter(|l| {
                l.title.to_lowercase().contains(&needle)
                    || l.summary.to_lowercase().contains(&needle)
                    || l.content.to_lowercase().contains(&needle)
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn apply_submission(
        &self,
        user_id: &str,
        lesson_id: i64,
        score: i64,
        completed: bool,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let key = Progress::key(user_id, lesson_id);
        let now = Utc::now();

        inner
            .progress
            .entry(key.clone())
            .and_modify(|row| {
                row.completed = completed;
                row.score = score;
                row.updated_at = now;
            })
            .or_insert_with(|| Progress {
                id: key,
                user_id: user_id.to_string(),
                lesson_id,
                started: false,
                completed,
                score,
                updated_at: now,
            });

        // Counted under the same lock as the upsert: the THREE_LESSONS rule
        // always sees the row written above.
        Ok(inner
            .progress
            .values()
            .filter(|p| p.user_id == user_id && p.completed)
            .count() as u64)
    }

    async fn mark_started(&self, user_id: &str, lesson_id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let key = Progress::key(user_id, lesson_id);
        let now = Utc::now();

        inner
            .progress
            .entry(key.clone())
            .and_modify(|row| {
                row.started = true;
                row.updated_at = now;
            })
            .or_insert_with(|| Progress {
                id: key,
                user_id: user_id.to_string(),
                lesson_id,
                started: true,
                completed: false,
                score: 0,
                updated_at: now,
            });

        Ok(())
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<Progress>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Progress> = inner
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.lesson_id);
        Ok(rows)
    }

    async fn insert_achievement(&self, achievement: Achievement) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .achievements
            .entry(achievement.code.clone())
            .or_insert(achievement);
        Ok(())
    }

    async fn get_achievement(&self, code: &str) -> Result<Option<Achievement>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.achievements.get(code).cloned())
    }

    async fn unlock_achievement(&self, user_id: &str, code: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let key = UnlockRecord::key(user_id, code);
        if inner.unlocks.contains_key(&key) {
            return Ok(false);
        }

        inner.unlocks.insert(
            key.clone(),
            UnlockRecord {
                id: key,
                user_id: user_id.to_string(),
                code: code.to_string(),
                unlocked_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn get_unlock(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<Option<UnlockRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.unlocks.get(&UnlockRecord::key(user_id, code)).cloned())
    }

    async fn list_unlocks(&self, user_id: &str) -> Result<Vec<UnlockedAchievement>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut records: Vec<&UnlockRecord> = inner
            .unlocks
            .values()
            .filter(|r| r.user_id == user_id)
            .collect();
        records.sort_by(|a, b| b.unlocked_at.cmp(&a.unlocked_at));

        Ok(records
            .into_iter()
            .filter_map(|record| {
                inner
                    .achievements
                    .get(&record.code)
                    .map(|a| UnlockedAchievement {
                        code: a.code.clone(),
                        title: a.title.clone(),
                        description: a.description.clone(),
                        unlocked_at: record.unlocked_at,
                    })
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(id: i64) -> Lesson {
        Lesson {
            id,
            title: format!("Lesson {}", id),
            summary: "summary".to_string(),
            content: "content".to_string(),
            language: "Python".to_string(),
            topic: "Basics".to_string(),
            quizzes: vec![],
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        let user = NewUser {
            email: "kid@example.com".to_string(),
            password_hash: "x".to_string(),
            display_name: "Kid".to_string(),
        };
        store.insert_user(user.clone()).await.unwrap();
        assert!(matches!(
            store.insert_user(user).await,
            Err(StoreError::Conflict)
        ));
    }

    #[tokio::test]
    async fn submission_upsert_never_duplicates() {
        let store = MemoryStore::new();
        store.apply_submission("u1", 1, 2, true).await.unwrap();
        store.apply_submission("u1", 1, 0, false).await.unwrap();

        let rows = store.list_progress("u1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, 0);
        assert!(!rows[0].completed);
    }

    #[tokio::test]
    async fn completed_count_sees_own_write() {
        let store = MemoryStore::new();
        assert_eq!(store.apply_submission("u1", 1, 1, true).await.unwrap(), 1);
        assert_eq!(store.apply_submission("u1", 2, 1, true).await.unwrap(), 2);
        // Un-completing a lesson lowers the count again
        assert_eq!(store.apply_submission("u1", 1, 0, false).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mark_started_preserves_score() {
        let store = MemoryStore::new();
        store.apply_submission("u1", 1, 2, true).await.unwrap();
        store.mark_started("u1", 1).await.unwrap();

        let rows = store.list_progress("u1").await.unwrap();
        assert!(rows[0].started);
        assert!(rows[0].completed);
        assert_eq!(rows[0].score, 2);
    }

    #[tokio::test]
    async fn unlock_is_idempotent_and_keeps_timestamp() {
        let store = MemoryStore::new();
        assert!(store.unlock_achievement("u1", "PERFECT_SCORE").await.unwrap());
        let first = store.get_unlock("u1", "PERFECT_SCORE").await.unwrap().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert!(!store.unlock_achievement("u1", "PERFECT_SCORE").await.unwrap());
        let second = store.get_unlock("u1", "PERFECT_SCORE").await.unwrap().unwrap();
        assert_eq!(first.unlocked_at, second.unlocked_at);
    }

    #[tokio::test]
    async fn search_is_case_insensitive() {
        let store = MemoryStore::new();
        let mut l = lesson(1);
        l.content = "Use box-sizing: BORDER-BOX for predictable sizing.".to_string();
        store.insert_lesson(l).await.unwrap();
        store.insert_lesson(lesson(2)).await.unwrap();

        let hits = store.search_lessons("border-box", 50).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }
}
