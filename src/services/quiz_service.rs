use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::QuizListItemEntity,
    dto::quiz::{CreateQuizRequest, QuizListItem, QuizSummary},
    error::ServiceError,
    services::session_service,
    state::{SharedState, quiz::Quiz},
};

/// Persist a new quiz and open its live session.
pub async fn create_quiz(
    state: &SharedState,
    request: CreateQuizRequest,
) -> Result<QuizSummary, ServiceError> {
    let store = state.require_quiz_store().await?;
    let quiz: Quiz = request.into();
    store.put(quiz.clone().into()).await?;

    let quiz_id = quiz.id;
    info!(
        %quiz_id,
        title = %quiz.title,
        questions = quiz.questions.len(),
        "quiz created"
    );
    session_service::open_session(state, quiz.clone());
    Ok(QuizSummary::from_quiz(quiz, state.config().join_url(quiz_id)))
}

/// Catalogue of stored quizzes.
pub async fn list_quizzes(state: &SharedState) -> Result<Vec<QuizListItem>, ServiceError> {
    let store = state.require_quiz_store().await?;
    let quizzes = store.list_all().await?;
    Ok(quizzes
        .iter()
        .map(QuizListItemEntity::from)
        .map(Into::into)
        .collect())
}

/// A quiz as currently known: the live session wins over the stored copy.
pub async fn get_quiz(state: &SharedState, quiz_id: Uuid) -> Result<QuizSummary, ServiceError> {
    let quiz = match state.session(quiz_id) {
        Some(handle) => handle.engine().lock().await.to_quiz(),
        None => {
            let store = state.require_quiz_store().await?;
            store
                .get(quiz_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("quiz `{quiz_id}` not found")))?
                .into()
        }
    };
    Ok(QuizSummary::from_quiz(quiz, state.config().join_url(quiz_id)))
}

/// Close the live session and remove the stored quiz.
pub async fn delete_quiz(state: &SharedState, quiz_id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_quiz_store().await?;

    // Commands and ticks persist under the engine lock, so deleting while
    // holding it leaves nothing in flight that could write the quiz back.
    let handle = state.session(quiz_id);
    let engine = match &handle {
        Some(handle) => Some(handle.engine().lock().await),
        None => None,
    };
    let live = match &handle {
        Some(handle) if !handle.is_closed() => {
            handle.close();
            state.remove_session(quiz_id);
            true
        }
        _ => false,
    };
    let stored = store.delete(quiz_id).await?;
    drop(engine);

    if !stored && !live {
        return Err(ServiceError::NotFound(format!("quiz `{quiz_id}` not found")));
    }
    info!(%quiz_id, "quiz deleted");
    Ok(())
}
