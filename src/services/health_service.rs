use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the storage backend and summarise live sessions.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.quiz_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        None => warn!("no quiz store installed (degraded mode)"),
    }

    let sse_subscribers = state
        .sessions()
        .iter()
        .map(|entry| entry.value().events().subscriber_count())
        .sum();
    HealthResponse::new(state.is_degraded(), state.sessions().len(), sse_subscribers)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::quiz_store::memory::MemoryQuizStore,
        state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, "degraded");

        state.set_quiz_store(Arc::new(MemoryQuizStore::new())).await;
        let report = health_status(&state).await;
        assert_eq!(report.status, "ok");
        assert_eq!(report.live_sessions, 0);
        assert_eq!(report.sse_subscribers, 0);
    }
}
