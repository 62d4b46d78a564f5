use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::session::{AnswerReceipt, AnswerRequest, PlayerSummary, SessionSnapshotDto, StandingDto},
    engine::{EngineError, SessionEngine, SessionSnapshot},
    error::ServiceError,
    services::{session_clock, sse_events},
    state::{SessionHandle, SharedState, quiz::Quiz},
};

/// Register a live session for `quiz` and start its clock. An already open
/// session for the same quiz wins.
pub fn open_session(state: &SharedState, quiz: Quiz) -> Arc<SessionHandle> {
    let quiz_id = quiz.id;
    let handle = match state.sessions().entry(quiz_id) {
        Entry::Occupied(entry) => return entry.get().clone(),
        Entry::Vacant(entry) => {
            let engine = SessionEngine::new(quiz, state.config().engine_options());
            let handle = Arc::new(SessionHandle::new(engine));
            entry.insert(handle.clone());
            handle
        }
    };

    session_clock::spawn(state.clone(), &handle);
    info!(%quiz_id, "session opened");
    handle
}

/// Live session for `quiz_id`, loading the quiz from storage on first use.
pub async fn session(state: &SharedState, quiz_id: Uuid) -> Result<Arc<SessionHandle>, ServiceError> {
    if let Some(handle) = state.session(quiz_id) {
        return Ok(handle);
    }

    let store = state.require_quiz_store().await?;
    let entity = store
        .get(quiz_id)
        .await?
        .ok_or_else(|| not_found(quiz_id))?;
    Ok(open_session(state, entity.into()))
}

fn not_found(quiz_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("quiz `{quiz_id}` not found"))
}

/// Add a player to the session.
pub async fn join(
    state: &SharedState,
    quiz_id: Uuid,
    name: &str,
) -> Result<PlayerSummary, ServiceError> {
    let (player, _) = run_command(state, quiz_id, "join", |engine| engine.join(name)).await?;
    if let Some(handle) = state.session(quiz_id) {
        sse_events::broadcast_presence(handle.events(), &player);
    }
    info!(%quiz_id, player_id = %player.id, name = %player.name, "player joined");
    Ok(player.into())
}

/// Mark a player as gone (or drop them from the lobby).
pub async fn leave(
    state: &SharedState,
    quiz_id: Uuid,
    player_id: Uuid,
) -> Result<SessionSnapshotDto, ServiceError> {
    let (departed, snapshot) = run_command(state, quiz_id, "leave", |engine| {
        engine.leave(player_id)?;
        Ok(engine.player(player_id).cloned())
    })
    .await?;
    // Players dropped from the lobby only show up in the snapshot.
    if let (Some(player), Some(handle)) = (departed, state.session(quiz_id)) {
        sse_events::broadcast_presence(handle.events(), &player);
    }
    info!(%quiz_id, %player_id, "player left");
    Ok(snapshot.into())
}

/// Open the first question.
pub async fn start(state: &SharedState, quiz_id: Uuid) -> Result<SessionSnapshotDto, ServiceError> {
    let ((), snapshot) = run_command(state, quiz_id, "start", SessionEngine::start).await?;
    Ok(snapshot.into())
}

/// Record a player's answer.
pub async fn submit_answer(
    state: &SharedState,
    quiz_id: Uuid,
    request: AnswerRequest,
) -> Result<AnswerReceipt, ServiceError> {
    let AnswerRequest {
        player_id,
        question_index,
        option_index,
    } = request;
    let (answer, _) = run_command(state, quiz_id, "answer", |engine| match question_index {
        Some(index) => engine.submit_answer_for(player_id, index, option_index),
        None => engine.submit_answer(player_id, option_index),
    })
    .await?;
    debug!(
        %quiz_id,
        %player_id,
        question_index = answer.question_index,
        points = answer.points_awarded,
        "answer recorded"
    );
    Ok(AnswerReceipt::new(player_id, &answer))
}

/// Close the open question early.
pub async fn reveal(state: &SharedState, quiz_id: Uuid) -> Result<SessionSnapshotDto, ServiceError> {
    let (_, snapshot) = run_command(state, quiz_id, "reveal", SessionEngine::reveal).await?;
    Ok(snapshot.into())
}

/// Move past the reveal.
pub async fn advance(state: &SharedState, quiz_id: Uuid) -> Result<SessionSnapshotDto, ServiceError> {
    let (_, snapshot) = run_command(state, quiz_id, "advance", SessionEngine::advance).await?;
    Ok(snapshot.into())
}

/// Freeze the countdown.
pub async fn pause(state: &SharedState, quiz_id: Uuid) -> Result<SessionSnapshotDto, ServiceError> {
    let ((), snapshot) = run_command(state, quiz_id, "pause", SessionEngine::pause).await?;
    Ok(snapshot.into())
}

/// Continue the countdown.
pub async fn resume(state: &SharedState, quiz_id: Uuid) -> Result<SessionSnapshotDto, ServiceError> {
    let ((), snapshot) = run_command(state, quiz_id, "resume", SessionEngine::resume).await?;
    Ok(snapshot.into())
}

/// Wipe the run back to an empty lobby.
pub async fn reset(state: &SharedState, quiz_id: Uuid) -> Result<SessionSnapshotDto, ServiceError> {
    let ((), snapshot) = run_command(state, quiz_id, "reset", SessionEngine::reset).await?;
    Ok(snapshot.into())
}

/// Current snapshot of the session.
pub async fn snapshot(state: &SharedState, quiz_id: Uuid) -> Result<SessionSnapshotDto, ServiceError> {
    let handle = session(state, quiz_id).await?;
    let engine = handle.engine().lock().await;
    if handle.is_closed() {
        return Err(not_found(quiz_id));
    }
    Ok(engine.snapshot().into())
}

/// Ranked standings, available whatever the leaderboard setting.
pub async fn standings(state: &SharedState, quiz_id: Uuid) -> Result<Vec<StandingDto>, ServiceError> {
    let handle = session(state, quiz_id).await?;
    let engine = handle.engine().lock().await;
    if handle.is_closed() {
        return Err(not_found(quiz_id));
    }
    Ok(engine.standings().into_iter().map(Into::into).collect())
}

/// Write the quiz document, logging failures. Never fails the caller.
pub async fn persist(state: &SharedState, quiz: Quiz) {
    let quiz_id = quiz.id;
    let Some(store) = state.quiz_store().await else {
        debug!(%quiz_id, "no storage installed; session kept in memory only");
        return;
    };

    if let Err(err) = store.put(quiz.into()).await {
        warn!(%quiz_id, error = %err, "failed to persist quiz session");
    }
}

/// Run `op` under the session lock, then broadcast and persist the outcome.
async fn run_command<T, F>(
    state: &SharedState,
    quiz_id: Uuid,
    command: &'static str,
    op: F,
) -> Result<(T, SessionSnapshot), ServiceError>
where
    F: FnOnce(&mut SessionEngine) -> Result<T, EngineError>,
{
    let handle = session(state, quiz_id).await?;
    let mut engine = handle.engine().lock().await;
    if handle.is_closed() {
        return Err(not_found(quiz_id));
    }
    let version = engine.version();

    let value = op(&mut *engine).map_err(|err| {
        debug!(%quiz_id, command, error = %err, "session command rejected");
        ServiceError::from(err)
    })?;

    let snapshot = engine.snapshot();
    if snapshot.version != version {
        info!(%quiz_id, command, phase = ?snapshot.phase, "session phase changed");
    }
    sse_events::broadcast_snapshot(handle.events(), snapshot.clone());
    persist(state, engine.to_quiz()).await;
    Ok((value, snapshot))
}
