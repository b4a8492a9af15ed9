use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{create_test_app, get_json, post_json, register_user};

fn codes(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|a| a["code"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn first_perfect_submission_unlocks_two_achievements() {
    let app = create_test_app().await;
    let token = register_user(&app, "kid@example.com").await;

    post_json(
        &app,
        "/api/lessons/1/submit",
        Some(&token),
        json!({ "answers": [0, 1] }),
    )
    .await;

    let (status, body) = get_json(&app, "/api/me/achievements", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let unlocked = codes(&body);
    assert!(unlocked.contains(&"FIRST_LESSON_COMPLETE".to_string()));
    assert!(unlocked.contains(&"PERFECT_SCORE".to_string()));
    assert!(!unlocked.contains(&"THREE_LESSONS".to_string()));
}

#[tokio::test]
async fn zero_quiz_completion_is_not_a_perfect_score() {
    let app = create_test_app().await;
    let token = register_user(&app, "kid@example.com").await;

    // Lesson 2 has no quizzes: completing it counts as a first lesson but
    // never as a perfect score.
    post_json(
        &app,
        "/api/lessons/2/submit",
        Some(&token),
        json!({ "answers": [] }),
    )
    .await;

    let (_, body) = get_json(&app, "/api/me/achievements", Some(&token)).await;
    let unlocked = codes(&body);
    assert!(unlocked.contains(&"FIRST_LESSON_COMPLETE".to_string()));
    assert!(!unlocked.contains(&"PERFECT_SCORE".to_string()));
}

#[tokio::test]
async fn failed_submission_unlocks_nothing() {
    let app = create_test_app().await;
    let token = register_user(&app, "kid@example.com").await;

    post_json(
        &app,
        "/api/lessons/1/submit",
        Some(&token),
        json!({ "answers": [1, 0] }),
    )
    .await;

    let (_, body) = get_json(&app, "/api/me/achievements", Some(&token)).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn three_lessons_unlocks_exactly_at_three() {
    let app = create_test_app().await;
    let token = register_user(&app, "kid@example.com").await;

    // Complete lessons 1 and 2
    post_json(
        &app,
        "/api/lessons/1/submit",
        Some(&token),
        json!({ "answers": [0, 1] }),
    )
    .await;
    post_json(
        &app,
        "/api/lessons/2/submit",
        Some(&token),
        json!({ "answers": [] }),
    )
    .await;

    let (_, body) = get_json(&app, "/api/me/achievements", Some(&token)).await;
    assert!(
        !codes(&body).contains(&"THREE_LESSONS".to_string()),
        "two completions must not unlock THREE_LESSONS"
    );

    // The third completed lesson tips the rule
    post_json(
        &app,
        "/api/lessons/3/submit",
        Some(&token),
        json!({ "answers": [0] }),
    )
    .await;

    let (_, body) = get_json(&app, "/api/me/achievements", Some(&token)).await;
    assert!(codes(&body).contains(&"THREE_LESSONS".to_string()));
}

#[tokio::test]
async fn recompleting_the_same_lesson_does_not_count_twice() {
    let app = create_test_app().await;
    let token = register_user(&app, "kid@example.com").await;

    // Three perfect runs of the same lesson are still one completed lesson
    for _ in 0..3 {
        post_json(
            &app,
            "/api/lessons/1/submit",
            Some(&token),
            json!({ "answers": [0, 1] }),
        )
        .await;
    }

    let (_, body) = get_json(&app, "/api/me/achievements", Some(&token)).await;
    assert!(!codes(&body).contains(&"THREE_LESSONS".to_string()));
}

#[tokio::test]
async fn explicit_unlock_is_idempotent_and_keeps_the_first_timestamp() {
    let app = create_test_app().await;
    let token = register_user(&app, "kid@example.com").await;

    let (status, first) = post_json(
        &app,
        "/api/achievements/unlock",
        Some(&token),
        json!({ "code": "PERFECT_SCORE" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["code"], "PERFECT_SCORE");
    assert_eq!(first["title"], "Perfect!");

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let (status, second) = post_json(
        &app,
        "/api/achievements/unlock",
        Some(&token),
        json!({ "code": "PERFECT_SCORE" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["unlocked_at"], second["unlocked_at"]);

    let (_, body) = get_json(&app, "/api/me/achievements", Some(&token)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_achievement_code_is_rejected() {
    let app = create_test_app().await;
    let token = register_user(&app, "kid@example.com").await;

    let (status, body) = post_json(
        &app,
        "/api/achievements/unlock",
        Some(&token),
        json!({ "code": "MADE_UP_CODE" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unknown achievement code");
}

#[tokio::test]
async fn client_supplied_title_is_ignored() {
    let app = create_test_app().await;
    let token = register_user(&app, "kid@example.com").await;

    let (status, body) = post_json(
        &app,
        "/api/achievements/unlock",
        Some(&token),
        json!({
            "code": "PERFECT_SCORE",
            "title": "Hacked Title",
            "description": "Hacked description",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Perfect!");
    assert_eq!(
        body["description"],
        "Get every quiz question right in one lesson"
    );
}

#[tokio::test]
async fn unlocks_are_scoped_to_the_caller() {
    let app = create_test_app().await;
    let token_a = register_user(&app, "a@example.com").await;
    let token_b = register_user(&app, "b@example.com").await;

    post_json(
        &app,
        "/api/achievements/unlock",
        Some(&token_a),
        json!({ "code": "PERFECT_SCORE" }),
    )
    .await;

    let (_, body) = get_json(&app, "/api/me/achievements", Some(&token_b)).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}
