use std::sync::Arc;

use crate::error::ApiError;
use crate::metrics::{ACHIEVEMENTS_UNLOCKED_TOTAL, SUBMISSIONS_TOTAL};
use crate::models::achievement::{
    UnlockedAchievement, FIRST_LESSON_COMPLETE, PERFECT_SCORE, THREE_LESSONS,
};
use crate::models::lesson::Quiz;
use crate::models::progress::SubmitResponse;
use crate::store::Store;

/// The submission workflow: score a quiz run, upsert the progress ledger and
/// evaluate the achievement rules, in that order. Also owns the lighter
/// mark-started and unlock operations.
pub struct ProgressService {
    store: Arc<dyn Store>,
}

impl ProgressService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Score `answers` against the lesson's quizzes, record the result and
    /// evaluate the three unlock rules. NotFound on an unknown lesson leaves
    /// no trace in either ledger.
    pub async fn submit(
        &self,
        user_id: &str,
        lesson_id: i64,
        answers: &[i64],
    ) -> Result<SubmitResponse, ApiError> {
        let lesson = self
            .store
            .get_lesson(lesson_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

        let (score, completed) = score_answers(&lesson.quizzes, answers);
        let total = lesson.quizzes.len() as i64;

        let completed_lessons = self
            .store
            .apply_submission(user_id, lesson_id, score, completed)
            .await?;

        SUBMISSIONS_TOTAL
            .with_label_values(&[if completed { "true" } else { "false" }])
            .inc();

        tracing::info!(
            user_id = %user_id,
            lesson_id,
            score,
            total,
            completed,
            "Submission recorded"
        );

        // Rules run unconditionally after every submission. Each unlock is
        // insert-if-absent, so repeats are no-ops.
        if completed {
            self.unlock(user_id, FIRST_LESSON_COMPLETE).await?;
        }
        if total > 0 && score == total {
            self.unlock(user_id, PERFECT_SCORE).await?;
        }
        if completed_lessons >= 3 {
            self.unlock(user_id, THREE_LESSONS).await?;
        }

        Ok(SubmitResponse {
            score,
            total,
            completed,
        })
    }

    /// Mark the lesson's learning content as acknowledged. Does not touch
    /// `completed`/`score`.
    pub async fn start(&self, user_id: &str, lesson_id: i64) -> Result<(), ApiError> {
        if self.store.get_lesson(lesson_id).await?.is_none() {
            return Err(ApiError::NotFound("Lesson not found".to_string()));
        }
        self.store.mark_started(user_id, lesson_id).await?;
        Ok(())
    }

    /// Client-requested unlock. The catalog is closed: unknown codes are
    /// rejected and never created from client input. Returns the unlock
    /// record with its original timestamp, whether or not this call created it.
    pub async fn unlock_for_client(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<UnlockedAchievement, ApiError> {
        let achievement = self
            .store
            .get_achievement(code)
            .await?
            .ok_or_else(|| ApiError::NotFound("Unknown achievement code".to_string()))?;

        self.unlock(user_id, code).await?;

        let record = self
            .store
            .get_unlock(user_id, code)
            .await?
            .ok_or_else(|| anyhow::anyhow!("unlock record missing after upsert"))?;

        Ok(UnlockedAchievement {
            code: achievement.code,
            title: achievement.title,
            description: achievement.description,
            unlocked_at: record.unlocked_at,
        })
    }

    async fn unlock(&self, user_id: &str, code: &str) -> Result<(), ApiError> {
        let newly_unlocked = self.store.unlock_achievement(user_id, code).await?;
        if newly_unlocked {
            ACHIEVEMENTS_UNLOCKED_TOTAL.with_label_values(&[code]).inc();
            tracing::info!(user_id = %user_id, code = %code, "Achievement unlocked");
        }
        Ok(())
    }
}

/// Positional scoring: answer `i` counts iff it equals quiz `i`'s correct
/// index. Missing positions never match, extra answers are ignored. A lesson
/// with no quizzes is vacuously complete.
fn score_answers(quizzes: &[Quiz], answers: &[i64]) -> (i64, bool) {
    let mut score = 0;
    for (i, quiz) in quizzes.iter().enumerate() {
        if answers.get(i) == Some(&quiz.answer_index) {
            score += 1;
        }
    }
    let completed = quizzes.is_empty() || score == quizzes.len() as i64;
    (score, completed)
}
