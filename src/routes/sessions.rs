use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::session::{
        AnswerReceipt, AnswerRequest, JoinRequest, PlayerSummary, SessionSnapshotDto,
        StandingDto,
    },
    error::AppError,
    routes::extract::ValidJson,
    services::session_service,
    state::SharedState,
};

/// Player and host commands against a live session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions/{id}", get(get_snapshot))
        .route("/sessions/{id}/standings", get(get_standings))
        .route("/sessions/{id}/join", post(join))
        .route("/sessions/{id}/players/{player_id}/leave", post(leave))
        .route("/sessions/{id}/answer", post(answer))
        .route("/sessions/{id}/start", post(start))
        .route("/sessions/{id}/reveal", post(reveal))
        .route("/sessions/{id}/advance", post(advance))
        .route("/sessions/{id}/pause", post(pause))
        .route("/sessions/{id}/resume", post(resume))
        .route("/sessions/{id}/reset", post(reset))
}

/// Current view of the session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    responses(
        (status = 200, description = "Session snapshot", body = SessionSnapshotDto),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn get_snapshot(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshotDto>, AppError> {
    Ok(Json(session_service::snapshot(&state, id).await?))
}

/// Ranked standings of every player, connected or not.
#[utoipa::path(
    get,
    path = "/sessions/{id}/standings",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    responses((status = 200, description = "Standings", body = [StandingDto]))
)]
pub async fn get_standings(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StandingDto>>, AppError> {
    Ok(Json(session_service::standings(&state, id).await?))
}

/// Enter the session under a display name.
#[utoipa::path(
    post,
    path = "/sessions/{id}/join",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Player joined or rejoined", body = PlayerSummary),
        (status = 400, description = "Invalid name"),
        (status = 409, description = "Session full, name taken or already started")
    )
)]
pub async fn join(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<JoinRequest>,
) -> Result<Json<PlayerSummary>, AppError> {
    Ok(Json(session_service::join(&state, id, &payload.name).await?))
}

/// Leave the session.
#[utoipa::path(
    post,
    path = "/sessions/{id}/players/{player_id}/leave",
    tag = "sessions",
    params(
        ("id" = String, Path, description = "Identifier of the quiz"),
        ("player_id" = String, Path, description = "Identifier of the leaving player")
    ),
    responses(
        (status = 200, description = "Player left", body = SessionSnapshotDto),
        (status = 404, description = "Unknown quiz or player")
    )
)]
pub async fn leave(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SessionSnapshotDto>, AppError> {
    Ok(Json(session_service::leave(&state, id, player_id).await?))
}

/// Submit an answer for the open question.
#[utoipa::path(
    post,
    path = "/sessions/{id}/answer",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = AnswerReceipt),
        (status = 404, description = "Unknown player, option or question"),
        (status = 409, description = "No open question, paused, or already answered")
    )
)]
pub async fn answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<AnswerRequest>,
) -> Result<Json<AnswerReceipt>, AppError> {
    Ok(Json(session_service::submit_answer(&state, id, payload).await?))
}

/// Open the first question.
#[utoipa::path(
    post,
    path = "/sessions/{id}/start",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    responses(
        (status = 200, description = "Session started", body = SessionSnapshotDto),
        (status = 409, description = "No players or not in the lobby")
    )
)]
pub async fn start(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshotDto>, AppError> {
    Ok(Json(session_service::start(&state, id).await?))
}

/// Close the open question and show its answer.
#[utoipa::path(
    post,
    path = "/sessions/{id}/reveal",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    responses(
        (status = 200, description = "Question revealed", body = SessionSnapshotDto),
        (status = 409, description = "No open question")
    )
)]
pub async fn reveal(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshotDto>, AppError> {
    Ok(Json(session_service::reveal(&state, id).await?))
}

/// Open the next question or finish the quiz.
#[utoipa::path(
    post,
    path = "/sessions/{id}/advance",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    responses(
        (status = 200, description = "Session advanced", body = SessionSnapshotDto),
        (status = 409, description = "Not showing a reveal")
    )
)]
pub async fn advance(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshotDto>, AppError> {
    Ok(Json(session_service::advance(&state, id).await?))
}

/// Freeze the countdown.
#[utoipa::path(
    post,
    path = "/sessions/{id}/pause",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    responses(
        (status = 200, description = "Session paused", body = SessionSnapshotDto),
        (status = 409, description = "No open question or already paused")
    )
)]
pub async fn pause(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshotDto>, AppError> {
    Ok(Json(session_service::pause(&state, id).await?))
}

/// Continue a paused countdown.
#[utoipa::path(
    post,
    path = "/sessions/{id}/resume",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    responses(
        (status = 200, description = "Session resumed", body = SessionSnapshotDto),
        (status = 409, description = "Not paused")
    )
)]
pub async fn resume(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshotDto>, AppError> {
    Ok(Json(session_service::resume(&state, id).await?))
}

/// Return the session to an empty lobby.
#[utoipa::path(
    post,
    path = "/sessions/{id}/reset",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the quiz")),
    responses((status = 200, description = "Session reset", body = SessionSnapshotDto))
)]
pub async fn reset(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshotDto>, AppError> {
    Ok(Json(session_service::reset(&state, id).await?))
}
