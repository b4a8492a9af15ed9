use serde::{Deserialize, Serialize};

/// Lesson stored in the "lessons" collection. Immutable reference data after
/// seeding. Quizzes embed as an ordered array so "stored order" is structural.
///
/// Lesson ids are plain integers so path parsing rejects non-numeric ids the
/// same way the public API documents (400, not 404).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(rename = "_id")]
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub language: String,
    pub topic: String,
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
}

/// A single multiple-choice question. `answer_index` is a valid zero-based
/// index into `options` and must never reach a client-facing shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: i64,
}

/// Lesson list/search entry (no content body, no quizzes).
#[derive(Debug, Serialize)]
pub struct LessonSummary {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub language: String,
    pub topic: String,
}

impl From<&Lesson> for LessonSummary {
    fn from(lesson: &Lesson) -> Self {
        LessonSummary {
            id: lesson.id,
            title: lesson.title.clone(),
            summary: lesson.summary.clone(),
            language: lesson.language.clone(),
            topic: lesson.topic.clone(),
        }
    }
}

/// Client-facing quiz: the correct index is stripped.
#[derive(Debug, Serialize)]
pub struct QuizView {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
}

/// Full lesson detail returned by GET /api/lessons/{id}.
#[derive(Debug, Serialize)]
pub struct LessonDetail {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub language: String,
    pub topic: String,
    pub quizzes: Vec<QuizView>,
}

impl From<Lesson> for LessonDetail {
    fn from(lesson: Lesson) -> Self {
        LessonDetail {
            id: lesson.id,
            title: lesson.title,
            summary: lesson.summary,
            content: lesson.content,
            language: lesson.language,
            topic: lesson.topic,
            quizzes: lesson
                .quizzes
                .into_iter()
                .map(|q| QuizView {
                    id: q.id,
                    question: q.question,
                    options: q.options,
                })
                .collect(),
        }
    }
}

/// Aggregated lesson count per language.
#[derive(Debug, Serialize)]
pub struct LanguageCount {
    pub language: String,
    pub count: i64,
}

/// Aggregated lesson count per topic.
#[derive(Debug, Serialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: i64,
}

/// Query params for GET /api/lessons
#[derive(Debug, Deserialize)]
pub struct ListLessonsQuery {
    pub language: Option<String>,
    pub topic: Option<String>,
}

/// Query params for GET /api/catalog/topics
#[derive(Debug, Deserialize)]
pub struct TopicsQuery {
    pub language: Option<String>,
}

/// Query params for GET /api/search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}
