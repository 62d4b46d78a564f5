use std::sync::{Arc, Weak};

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{
    engine::{EngineError, TickEffect},
    services::{session_service, sse_events},
    state::{SessionHandle, SharedState},
};

/// Start the clock task of a session. The task holds a weak reference and
/// ends by itself once the session is dropped.
pub fn spawn(state: SharedState, handle: &Arc<SessionHandle>) {
    let session = Arc::downgrade(handle);
    let task = tokio::spawn(run(state, session));
    handle.attach_clock(task);
}

async fn run(state: SharedState, session: Weak<SessionHandle>) {
    let mut ticker = interval(state.config().tick_interval());
    // Late ticks are skipped; the engine measures elapsed wall time itself.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(handle) = session.upgrade() else {
            break;
        };
        if let Err(err) = tick_once(&state, &handle).await {
            warn!(quiz_id = %handle.quiz_id(), error = %err, "session tick failed");
        }
    }

    debug!("session clock stopped");
}

/// Feed one tick to the engine, then broadcast and persist what changed.
pub async fn tick_once(
    state: &SharedState,
    handle: &SessionHandle,
) -> Result<TickEffect, EngineError> {
    let mut engine = handle.engine().lock().await;
    if handle.is_closed() {
        return Ok(TickEffect::Idle);
    }
    let effect = engine.tick()?;

    match effect {
        TickEffect::Idle => {}
        TickEffect::Counted(_) => {
            sse_events::broadcast_snapshot(handle.events(), engine.snapshot());
        }
        TickEffect::Transitioned(phase) => {
            info!(quiz_id = %handle.quiz_id(), ?phase, "session advanced by clock");
            sse_events::broadcast_snapshot(handle.events(), engine.snapshot());
            session_service::persist(state, engine.to_quiz()).await;
        }
    }

    Ok(effect)
}
