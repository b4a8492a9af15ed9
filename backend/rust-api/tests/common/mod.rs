#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use kidcode_api::models::achievement::Achievement;
use kidcode_api::models::lesson::{Lesson, Quiz};
use kidcode_api::store::memory::MemoryStore;
use kidcode_api::store::Store;
use kidcode_api::{config::Config, create_router, services::AppState};

/// Build the full router over an isolated in-memory store, pre-seeded with a
/// small lesson catalog and the achievement catalog. Each call returns a
/// completely independent world.
pub async fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let store = MemoryStore::new();
    seed_test_data(&store).await;

    let config = Config {
        mongo_uri: "mongodb://unused-in-tests".to_string(),
        mongo_database: "unused".to_string(),
        jwt_secret: "test-secret".to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
    };

    let app_state = Arc::new(AppState::new(config, Arc::new(store)));
    create_router(app_state)
}

async fn seed_test_data(store: &MemoryStore) {
    // Four lessons spanning two languages and three topics:
    //   1 Python/Basics     two quizzes, correct answers [0, 1]
    //   2 Python/Loops      no quizzes (reading-only)
    //   3 JavaScript/Basics one quiz, correct answer 0
    //   4 JavaScript/Functions three quizzes, correct answers [0, 1, 2]
    let lessons = vec![
        Lesson {
            id: 1,
            title: "Python Variables".to_string(),
            summary: "Name your data".to_string(),
            content: "Store values in variables so you can use them later.".to_string(),
            language: "Python".to_string(),
            topic: "Basics".to_string(),
            quizzes: vec![quiz("q1-1", 0), quiz("q1-2", 1)],
        },
        Lesson {
            id: 2,
            title: "Loops and Repetition".to_string(),
            summary: "Do things again and again".to_string(),
            content: "A reading-only lesson about repeating steps.".to_string(),
            language: "Python".to_string(),
            topic: "Loops".to_string(),
            quizzes: vec![],
        },
        Lesson {
            id: 3,
            title: "JavaScript Numbers".to_string(),
            summary: "Counting with code".to_string(),
            content: "Numbers behave the same in most programs.".to_string(),
            language: "JavaScript".to_string(),
            topic: "Basics".to_string(),
            quizzes: vec![quiz("q3-1", 0)],
        },
        Lesson {
            id: 4,
            title: "Writing Functions".to_string(),
            summary: "Reusable blocks of code".to_string(),
            content: "Functions take inputs and return outputs.".to_string(),
            language: "JavaScript".to_string(),
            topic: "Functions".to_string(),
            quizzes: vec![quiz("q4-1", 0), quiz("q4-2", 1), quiz("q4-3", 2)],
        },
    ];

    for lesson in lessons {
        store.insert_lesson(lesson).await.unwrap();
    }

    let achievements = vec![
        Achievement {
            code: "FIRST_LESSON_COMPLETE".to_string(),
            title: "First Steps".to_string(),
            description: "Complete your first lesson".to_string(),
        },
        Achievement {
            code: "PERFECT_SCORE".to_string(),
            title: "Perfect!".to_string(),
            description: "Get every quiz question right in one lesson".to_string(),
        },
        Achievement {
            code: "THREE_LESSONS".to_string(),
            title: "Getting the Hang of It".to_string(),
            description: "Complete three lessons".to_string(),
        },
    ];

    for achievement in achievements {
        store.insert_achievement(achievement).await.unwrap();
    }
}

fn quiz(id: &str, answer_index: i64) -> Quiz {
    Quiz {
        id: id.to_string(),
        question: format!("Question {}", id),
        options: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        answer_index,
    }
}

/// POST a JSON body, optionally with a bearer token. Returns status and the
/// parsed JSON body (or Null for empty bodies).
pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// GET a path, optionally with a bearer token.
pub async fn get_json(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Register a fresh user and return their access token.
pub async fn register_user(app: &Router, email: &str) -> String {
    let (status, body) = post_json(
        app,
        "/api/auth/register",
        None,
        json!({
            "email": email,
            "password": "password123",
            "display_name": "Test Kid",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    body["token"]
        .as_str()
        .expect("registration response missing token")
        .to_string()
}
