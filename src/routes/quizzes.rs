use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::quiz::{CreateQuizRequest, QuizListItem, QuizSummary},
    error::AppError,
    routes::extract::ValidJson,
    services::quiz_service,
    state::SharedState,
};

/// Quiz authoring and catalogue endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/quizzes", get(list_quizzes).post(create_quiz))
        .route("/quizzes/{id}", get(get_quiz).delete(delete_quiz))
}

/// Create a quiz and open its live session.
#[utoipa::path(
    post,
    path = "/quizzes",
    tag = "quizzes",
    request_body = CreateQuizRequest,
    responses(
        (status = 201, description = "Quiz created", body = QuizSummary),
        (status = 400, description = "Invalid quiz definition"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn create_quiz(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<CreateQuizRequest>,
) -> Result<(StatusCode, Json<QuizSummary>), AppError> {
    let summary = quiz_service::create_quiz(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// List stored quizzes.
#[utoipa::path(
    get,
    path = "/quizzes",
    tag = "quizzes",
    responses((status = 200, description = "Stored quizzes", body = [QuizListItem]))
)]
pub async fn list_quizzes(
    State(state): State<SharedState>,
) -> Result<Json<Vec<QuizListItem>>, AppError> {
    Ok(Json(quiz_service::list_quizzes(&state).await?))
}

/// Retrieve a quiz, including the players of its latest run.
#[utoipa::path(
    get,
    path = "/quizzes/{id}",
    tag = "quizzes",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    responses(
        (status = 200, description = "Quiz", body = QuizSummary),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn get_quiz(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizSummary>, AppError> {
    Ok(Json(quiz_service::get_quiz(&state, id).await?))
}

/// Delete a quiz and close its live session.
#[utoipa::path(
    delete,
    path = "/quizzes/{id}",
    tag = "quizzes",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    responses(
        (status = 204, description = "Quiz deleted"),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn delete_quiz(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    quiz_service::delete_quiz(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
