use anyhow::Context;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::achievement::{
    Achievement, FIRST_LESSON_COMPLETE, PERFECT_SCORE, THREE_LESSONS,
};
use crate::models::lesson::{Lesson, Quiz};
use crate::models::user::NewUser;
use crate::store::Store;

/// Seed reference data on first startup: the lesson catalog with its
/// quizzes, the closed achievement catalog, and a demo account. Lessons are
/// the emptiness sentinel; achievements and the demo user are upserted
/// idempotently so partial earlier runs heal themselves.
pub async fn seed_if_empty(store: &dyn Store) -> anyhow::Result<()> {
    seed_achievements(store).await?;
    seed_demo_user(store).await?;

    if store.lesson_count().await? > 0 {
        tracing::debug!("Lesson catalog already seeded");
        return Ok(());
    }

    tracing::info!("Seeding lesson catalog");
    for lesson in lesson_catalog() {
        store
            .insert_lesson(lesson)
            .await
            .context("Failed to seed lesson")?;
    }

    Ok(())
}

async fn seed_achievements(store: &dyn Store) -> anyhow::Result<()> {
    let achievements = [
        (FIRST_LESSON_COMPLETE, "First Steps", "Complete your first lesson."),
        (PERFECT_SCORE, "Perfect!", "Score 100% on any lesson quiz."),
        (THREE_LESSONS, "Getting the Hang", "Complete three lessons."),
    ];

    for (code, title, description) in achievements {
        store
            .insert_achievement(Achievement {
                code: code.to_string(),
                title: title.to_string(),
                description: description.to_string(),
            })
            .await
            .context("Failed to seed achievement")?;
    }

    Ok(())
}

async fn seed_demo_user(store: &dyn Store) -> anyhow::Result<()> {
    let password_hash =
        bcrypt::hash("demo1234", bcrypt::DEFAULT_COST).context("Failed to hash demo password")?;

    match store
        .insert_user(NewUser {
            email: "demo@example.com".to_string(),
            password_hash,
            display_name: "Demo Kid".to_string(),
        })
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Demo user seeded");
            Ok(())
        }
        Err(StoreError::Conflict) => Ok(()),
        Err(e) => Err(e).context("Failed to seed demo user"),
    }
}

fn lesson_catalog() -> Vec<Lesson> {
    vec![
        lesson(
            1,
            "Sequencing Basics",
            "KidCode",
            "Basics",
            "Understand step-by-step instructions and order of operations.",
            "Programming executes instructions in sequence. Arrange steps to complete tasks like making a sandwich. In code, this means lines run from top to bottom unless we change the flow.",
            vec![quiz(
                "Which comes first when making tea?",
                &["Boil water", "Add tea leaves to dry cup", "Drink tea"],
                0,
            )],
        ),
        lesson(
            2,
            "Loops 101",
            "KidCode",
            "Loops",
            "Repeat actions using loops.",
            "Loops let us repeat actions many times. For example, repeat 5 times to draw 5 stars.",
            vec![quiz(
                "A loop is best for...?",
                &[
                    "Doing something once",
                    "Repeating an action many times",
                    "Stopping the program",
                ],
                1,
            )],
        ),
        lesson(
            3,
            "Conditions",
            "KidCode",
            "Conditions",
            "Make decisions with if/else.",
            "Conditions let the program choose different paths. If it rains, take an umbrella; else, wear sunglasses.",
            vec![],
        ),
        lesson(
            4,
            "HTML Introduction",
            "HTML",
            "Basics",
            "What is HTML and how a web page is structured.",
            "<!DOCTYPE html> defines an HTML5 document. Use <html>, <head>, and <body>. Headings use <h1>..</h1>. Paragraphs use <p>..</p>.",
            vec![quiz(
                "Which tag defines the main content displayed on the page?",
                &["<head>", "<body>", "<title>"],
                1,
            )],
        ),
        lesson(
            5,
            "HTML Links and Images",
            "HTML",
            "Elements",
            "Using <a> for links and <img> for images.",
            "Links: <a href=\"https://example.com\">Visit</a>. Images: <img src=\"cat.jpg\" alt=\"A cat\" />. Always include alt text.",
            vec![],
        ),
        lesson(
            6,
            "CSS Selectors",
            "CSS",
            "Selectors",
            "Select elements by tag, class, and id.",
            "p { color: blue } selects all paragraphs. .btn selects class=\"btn\". #main selects id=\"main\".",
            vec![quiz(
                "Which selector targets an element with id=\"main\"?",
                &[".main", "#main", "main"],
                1,
            )],
        ),
        lesson(
            7,
            "CSS Box Model",
            "CSS",
            "Layout",
            "Content, padding, border, margin.",
            "Every element is a box. Total size = content + padding + border + margin. Use box-sizing: border-box for predictable sizing.",
            vec![],
        ),
        lesson(
            8,
            "JS Variables",
            "JavaScript",
            "Basics",
            "let and const, and basic types.",
            "Use let for reassignable variables, const for constants. Example: const name = \"Ava\"; let age = 10;",
            vec![quiz(
                "Which keyword defines a constant?",
                &["var", "let", "const"],
                2,
            )],
        ),
        lesson(
            9,
            "JS Conditions",
            "JavaScript",
            "Control Flow",
            "if/else and comparison operators.",
            "if (age >= 13) { console.log(\"Teen\"); } else { console.log(\"Kid\"); }",
            vec![],
        ),
        lesson(
            10,
            "Python Print",
            "Python",
            "Basics",
            "Your first output.",
            "print(\"Hello, world!\") prints text to the screen. Strings use quotes.",
            vec![quiz(
                "What does print(\"Hi\") do?",
                &["Saves a file", "Outputs text", "Creates a variable"],
                1,
            )],
        ),
        lesson(
            11,
            "Python Loops",
            "Python",
            "Loops",
            "for and while loops.",
            "for i in range(5): print(i) prints 0..4. while loops repeat while a condition is true.",
            vec![],
        ),
    ]
}

fn lesson(
    id: i64,
    title: &str,
    language: &str,
    topic: &str,
    summary: &str,
    content: &str,
    quizzes: Vec<Quiz>,
) -> Lesson {
    Lesson {
        id,
        title: title.to_string(),
        summary: summary.to_string(),
        content: content.to_string(),
        language: language.to_string(),
        topic: topic.to_string(),
        quizzes,
    }
}

fn quiz(question: &str, options: &[&str], answer_index: i64) -> Quiz {
    Quiz {
        id: Uuid::new_v4().to_string(),
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        answer_index,
    }
}
