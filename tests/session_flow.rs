use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use quiz_session_back::{
    config::AppConfig,
    dao::quiz_store::memory::MemoryQuizStore,
    engine::{EngineOptions, ManualClock, SessionEngine, TickEffect},
    routes,
    services::session_clock,
    state::{
        AppState, SessionHandle, SharedState,
        quiz::{Difficulty, Question, Quiz, QuizSettings},
        state_machine::SessionPhase,
    },
};

async fn ready_state() -> SharedState {
    let state = AppState::new(AppConfig::default());
    state.set_quiz_store(Arc::new(MemoryQuizStore::new())).await;
    state
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn quiz_payload() -> Value {
    json!({
        "title": "Capitals",
        "host_name": "Grace",
        "questions": [{
            "text": "What is the capital of France?",
            "options": ["London", "Paris", "Berlin", "Madrid"],
            "correct_option_index": 1,
            "difficulty": "easy"
        }]
    })
}

#[tokio::test]
async fn host_runs_a_quiz_over_http() {
    let app = routes::router(ready_state().await);

    let (status, quiz) = send(&app, "POST", "/quizzes", Some(quiz_payload())).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = quiz["id"].as_str().unwrap().to_owned();

    let (status, ada) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/join"),
        Some(json!({ "name": "Ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, bob) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/join"),
        Some(json!({ "name": "Bob" })),
    )
    .await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/join"),
        Some(json!({ "name": "ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, snapshot) = send(&app, "POST", &format!("/sessions/{id}/start"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["phase"], "question");
    assert_eq!(snapshot["max_players"], 50);
    assert_eq!(snapshot["is_full"], false);
    assert!(snapshot["question"].get("correct_option_index").is_none());

    // The quiz document must not leak the answer key mid-run either.
    let (status, running) = send(&app, "GET", &format!("/quizzes/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(running["is_active"], true);
    assert!(running["questions"][0].get("correct_option_index").is_none());

    let (status, receipt) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/answer"),
        Some(json!({ "player_id": ada["id"], "option_index": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["question_index"], 0);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/answer"),
        Some(json!({ "player_id": bob["id"], "option_index": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/answer"),
        Some(json!({ "player_id": bob["id"], "option_index": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Everyone answered, so the question closed on its own.
    let (_, snapshot) = send(&app, "GET", &format!("/sessions/{id}"), None).await;
    assert_eq!(snapshot["phase"], "reveal");
    assert_eq!(snapshot["reveal"]["answered_count"], 2);
    assert_eq!(snapshot["reveal"]["correct_count"], 1);
    assert_eq!(snapshot["question"]["correct_option_index"], 1);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/sessions/{id}/answer"),
        Some(json!({ "player_id": bob["id"], "option_index": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, snapshot) = send(&app, "POST", &format!("/sessions/{id}/advance"), None).await;
    assert_eq!(snapshot["phase"], "finished");
    assert!(snapshot["leaderboard"].is_array());

    let (status, standings) = send(&app, "GET", &format!("/sessions/{id}/standings"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(standings[0]["name"], "Ada");
    assert_eq!(standings[0]["rank"], 1);
    assert_eq!(standings[1]["score"], 0);

    let (_, stored) = send(&app, "GET", &format!("/quizzes/{id}"), None).await;
    assert_eq!(stored["players"].as_array().unwrap().len(), 2);
    assert_eq!(stored["questions"][0]["correct_option_index"], 1);
}

#[tokio::test]
async fn invalid_quizzes_and_unknown_sessions_are_rejected() {
    let app = routes::router(ready_state().await);

    let mut payload = quiz_payload();
    payload["questions"][0]["options"] = json!(["Only"]);
    let (status, body) = send(&app, "POST", "/quizzes", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("options"));

    let (status, body) = send(&app, "POST", "/quizzes", Some(json!({ "title": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, _) = send(&app, "GET", &format!("/sessions/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, health) = send(&app, "GET", "/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn degraded_backend_refuses_new_quizzes() {
    let app = routes::router(AppState::new(AppConfig::default()));

    let (status, _) = send(&app, "POST", "/quizzes", Some(quiz_payload())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, health) = send(&app, "GET", "/healthcheck", None).await;
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn clock_ticks_close_the_question_and_notify_subscribers() {
    let state = ready_state().await;
    let question = Question {
        id: "q1".into(),
        text: "2 + 2?".into(),
        options: vec!["3".into(), "4".into()],
        correct_option_index: 1,
        category: "Maths".into(),
        difficulty: Difficulty::Easy,
        time_limit_seconds: 5,
        base_points: 100,
        explanation: None,
    };
    let quiz = Quiz::new(
        "Arithmetic".into(),
        String::new(),
        "Host".into(),
        vec![question],
        QuizSettings {
            time_per_question_seconds: 5,
            ..QuizSettings::default()
        },
    );
    let quiz_id = quiz.id;

    let clock = ManualClock::new();
    let options = EngineOptions {
        auto_advance: false,
        ..EngineOptions::default()
    };
    let engine = SessionEngine::new(quiz, options)
        .with_clock(Arc::new(clock.clone()))
        .with_seed(1);
    let handle = Arc::new(SessionHandle::new(engine));
    state.sessions().insert(quiz_id, handle.clone());

    {
        let mut engine = handle.engine().lock().await;
        engine.join("Ada").unwrap();
        engine.start().unwrap();
    }
    let mut events = handle.events().subscribe();

    clock.advance(Duration::from_secs(1));
    let effect = session_clock::tick_once(&state, &handle).await.unwrap();
    assert_eq!(effect, TickEffect::Counted(4));
    assert_eq!(events.recv().await.unwrap().event.as_deref(), Some("snapshot"));

    for _ in 0..4 {
        clock.advance(Duration::from_secs(1));
        session_clock::tick_once(&state, &handle).await.unwrap();
    }
    assert_eq!(handle.engine().lock().await.phase(), SessionPhase::QuestionReveal);

    // The transition was persisted.
    let store = state.quiz_store().await.unwrap();
    assert!(store.get(quiz_id).await.unwrap().is_some());
}
