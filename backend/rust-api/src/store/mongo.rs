use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use std::collections::HashMap;

use super::Store;
use crate::error::StoreError;
use crate::models::achievement::{Achievement, UnlockRecord, UnlockedAchievement};
use crate::models::lesson::{LanguageCount, Lesson, TopicCount};
use crate::models::progress::Progress;
use crate::models::user::{NewUser, User};

/// MongoDB-backed store. Uniqueness comes from document keys: a unique index
/// on `users.email`, and composite string `_id`s for the progress and unlock
/// ledgers, so every mutation is a single atomic keyed write.
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create the indexes the store relies on. Safe to call on every startup.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users()
            .create_index(email_index)
            .await
            .map_err(map_mongo_err)?;

        // Non-unique lookup indexes for the per-user ledgers
        let progress_index = IndexModel::builder().keys(doc! { "user_id": 1 }).build();
        self.progress()
            .create_index(progress_index)
            .await
            .map_err(map_mongo_err)?;

        let unlock_index = IndexModel::builder().keys(doc! { "user_id": 1 }).build();
        self.unlocks()
            .create_index(unlock_index)
            .await
            .map_err(map_mongo_err)?;

        Ok(())
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn lessons(&self) -> Collection<Lesson> {
        self.db.collection("lessons")
    }

    fn progress(&self) -> Collection<Progress> {
        self.db.collection("progress")
    }

    fn achievements(&self) -> Collection<Achievement> {
        self.db.collection("achievements")
    }

    fn unlocks(&self) -> Collection<UnlockRecord> {
        self.db.collection("user_achievements")
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = User {
            id: ObjectId::new().to_hex(),
            email: user.email,
            password_hash: user.password_hash,
            display_name: user.display_name,
            created_at: Utc::now(),
        };

        self.users()
            .insert_one(&user)
            .await
            .map_err(map_mongo_err)?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.users()
            .find_one(doc! { "email": email })
            .await
            .map_err(map_mongo_err)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.users()
            .find_one(doc! { "_id": id })
            .await
            .map_err(map_mongo_err)
    }

    async fn insert_lesson(&self, lesson: Lesson) -> Result<(), StoreError> {
        self.lessons()
            .insert_one(&lesson)
            .await
            .map_err(map_mongo_err)?;
        Ok(())
    }

    async fn lesson_count(&self) -> Result<u64, StoreError> {
        self.lessons()
            .count_documents(doc! {})
            .await
            .map_err(map_mongo_err)
    }

    async fn list_lessons(
        &self,
        language: Option<&str>,
        topic: Option<&str>,
    ) -> Result<Vec<Lesson>, StoreError> {
        let mut filter = Document::new();
        if let Some(language) = language {
            filter.insert("language", language);
        }
        if let Some(topic) = topic {
            filter.insert("topic", topic);
        }

        let mut cursor = self
            .lessons()
            .find(filter)
            .sort(doc! { "_id": 1 })
            .await
            .map_err(map_mongo_err)?;

        let mut lessons = Vec::new();
        while let Some(lesson) = cursor.try_next().await.map_err(map_mongo_err)? {
            lessons.push(lesson);
        }
        Ok(lessons)
    }

    async fn get_lesson(&self, id: i64) -> Result<Option<Lesson>, StoreError> {
        self.lessons()
            .find_one(doc! { "_id": id })
            .await
            .map_err(map_mongo_err)
    }

    async fn language_counts(&self) -> Result<Vec<LanguageCount>, StoreError> {
        let pipeline = vec![
            doc! { "$group": { "_id": "$language", "count": { "$sum": 1 } } },
            doc! { "$sort": { "_id": 1 } },
        ];

        let mut cursor = self
            .lessons()
            .aggregate(pipeline)
            .await
            .map_err(map_mongo_err)?;

        let mut counts = Vec::new();
        while let Some(group) = cursor.try_next().await.map_err(map_mongo_err)? {
            counts.push(LanguageCount {
                language: group
                    .get_str("_id")
                    .context("language group missing _id")?
                    .to_string(),
                count: group_count(&group),
            });
        }
        Ok(counts)
    }

    async fn topic_counts(&self, language: Option<&str>) -> Result<Vec<TopicCount>, StoreError> {
        let mut pipeline = Vec::new();
        if let Some(language) = language {
            pipeline.push(doc! { "$match": { "language": language } });
        }
        pipeline.push(doc! { "$group": { "_id": "$topic", "count": { "$sum": 1 } } });
        pipeline.push(doc! { "$sort": { "_id": 1 } });

        let mut cursor = self
            .lessons()
            .aggregate(pipeline)
            .await
            .map_err(map_mongo_err)?;

        let mut counts = Vec::new();
        while let Some(group) = cursor.try_next().await.map_err(map_mongo_err)? {
            counts.push(TopicCount {
                topic: group
                    .get_str("_id")
                    .context("topic group missing _id")?
                    .to_string(),
                count: group_count(&group),
            });
        }
        Ok(counts)
    }

    async fn search_lessons(&self, query: &str, limit: i64) -> Result<Vec<Lesson>, StoreError> {
        // User input becomes a $regex pattern; escape it so "c++" matches
        // literally instead of being a syntax error.
        let pattern = regex::escape(query);
        let filter = doc! {
            "$or": [
                { "title":   { "$regex": &pattern, "$options": "i" } },
                { "summary": { "$regex": &pattern, "$options": "i" } },
                { "content": { "$regex": &pattern, "$options": "i" } },
            ]
        };

        let mut cursor = self
            .lessons()
            .find(filter)
            .limit(limit)
            .await
            .map_err(map_mongo_err)?;

        let mut lessons = Vec::new();
        while let Some(lesson) = cursor.try_next().await.map_err(map_mongo_err)? {
            lessons.push(lesson);
        }
        Ok(lessons)
    }

    async fn apply_submission(
        &self,
        user_id: &str,
        lesson_id: i64,
        score: i64,
        completed: bool,
    ) -> Result<u64, StoreError> {
        let key = Progress::key(user_id, lesson_id);

        self.progress()
            .update_one(
                doc! { "_id": &key },
                doc! {
                    "$set": {
                        "completed": completed,
                        "score": score,
                        "updated_at": mongodb::bson::DateTime::now(),
                    },
                    "$setOnInsert": {
                        "user_id": user_id,
                        "lesson_id": lesson_id,
                        "started": false,
                    },
                },
            )
            .upsert(true)
            .await
            .map_err(map_mongo_err)?;

        // Read strictly after the durable upsert: this count feeds the
        // THREE_LESSONS rule and must see the row we just wrote.
        self.progress()
            .count_documents(doc! { "user_id": user_id, "completed": true })
            .await
            .map_err(map_mongo_err)
    }

    async fn mark_started(&self, user_id: &str, lesson_id: i64) -> Result<(), StoreError> {
        let key = Progress::key(user_id, lesson_id);

        self.progress()
            .update_one(
                doc! { "_id": &key },
                doc! {
                    "$set": {
                        "started": true,
                        "updated_at": mongodb::bson::DateTime::now(),
                    },
                    "$setOnInsert": {
                        "user_id": user_id,
                        "lesson_id": lesson_id,
                        "completed": false,
                        "score": 0_i64,
                    },
                },
            )
            .upsert(true)
            .await
            .map_err(map_mongo_err)?;

        Ok(())
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<Progress>, StoreError> {
        let mut cursor = self
            .progress()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "lesson_id": 1 })
            .await
            .map_err(map_mongo_err)?;

        let mut rows = Vec::new();
        while let Some(row) = cursor.try_next().await.map_err(map_mongo_err)? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn insert_achievement(&self, achievement: Achievement) -> Result<(), StoreError> {
        self.achievements()
            .update_one(
                doc! { "_id": &achievement.code },
                doc! {
                    "$setOnInsert": {
                        "title": &achievement.title,
                        "description": &achievement.description,
                    },
                },
            )
            .upsert(true)
            .await
            .map_err(map_mongo_err)?;
        Ok(())
    }

    async fn get_achievement(&self, code: &str) -> Result<Option<Achievement>, StoreError> {
        self.achievements()
            .find_one(doc! { "_id": code })
            .await
            .map_err(map_mongo_err)
    }

    async fn unlock_achievement(&self, user_id: &str, code: &str) -> Result<bool, StoreError> {
        let key = UnlockRecord::key(user_id, code);

        let result = self
            .unlocks()
            .update_one(
                doc! { "_id": &key },
                doc! {
                    "$setOnInsert": {
                        "user_id": user_id,
                        "code": code,
                        "unlocked_at": mongodb::bson::DateTime::now(),
                    },
                },
            )
            .upsert(true)
            .await
            .map_err(map_mongo_err)?;

        Ok(result.upserted_id.is_some())
    }

    async fn get_unlock(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<Option<UnlockRecord>, StoreError> {
        self.unlocks()
            .find_one(doc! { "_id": UnlockRecord::key(user_id, code) })
            .await
            .map_err(map_mongo_err)
    }

    async fn list_unlocks(&self, user_id: &str) -> Result<Vec<UnlockedAchievement>, StoreError> {
        let mut cursor = self
            .unlocks()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "unlocked_at": -1 })
            .await
            .map_err(map_mongo_err)?;

        let mut records = Vec::new();
        while let Some(record) = cursor.try_next().await.map_err(map_mongo_err)? {
            records.push(record);
        }

        // Join with the catalog in one pass instead of a lookup per record.
        let mut catalog = HashMap::new();
        let mut achievements = self
            .achievements()
            .find(doc! {})
            .await
            .map_err(map_mongo_err)?;
        while let Some(achievement) = achievements.try_next().await.map_err(map_mongo_err)? {
            catalog.insert(achievement.code.clone(), achievement);
        }

        Ok(records
            .into_iter()
            .filter_map(|record| {
                catalog.get(&record.code).map(|a| UnlockedAchievement {
                    code: a.code.clone(),
                    title: a.title.clone(),
                    description: a.description.clone(),
                    unlocked_at: record.unlocked_at,
                })
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(map_mongo_err)?;
        Ok(())
    }
}

/// Surface duplicate-key violations (code 11000) as `StoreError::Conflict`;
/// everything else is opaque backend failure.
fn map_mongo_err(err: mongodb::error::Error) -> StoreError {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref we)) =
        *err.kind
    {
        if we.code == 11000 {
            return StoreError::Conflict;
        }
    }
    StoreError::Backend(anyhow::Error::new(err))
}

fn group_count(group: &Document) -> i64 {
    match group.get("count") {
        Some(Bson::Int32(v)) => i64::from(*v),
        Some(Bson::Int64(v)) => *v,
        _ => 0,
    }
}
