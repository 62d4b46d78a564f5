use serde::Serialize;
use utoipa::ToSchema;

/// Liveness report returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" while no storage backend is usable.
    pub status: String,
    pub live_sessions: usize,
    /// Open SSE streams summed over every live session.
    pub sse_subscribers: usize,
}

impl HealthResponse {
    /// Build the report from the degraded flag and session counters.
    pub fn new(degraded: bool, live_sessions: usize, sse_subscribers: usize) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_owned(),
            live_sessions,
            sse_subscribers,
        }
    }
}
