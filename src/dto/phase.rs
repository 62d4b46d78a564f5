use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::SessionPhase;

/// Publicly visible session phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleSessionPhase {
    /// Lobby, players are joining.
    Waiting,
    /// A question is open.
    Question,
    /// Results of the current question are shown.
    Reveal,
    /// Final standings.
    Finished,
}

impl From<SessionPhase> for VisibleSessionPhase {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::Waiting => VisibleSessionPhase::Waiting,
            SessionPhase::QuestionActive => VisibleSessionPhase::Question,
            SessionPhase::QuestionReveal => VisibleSessionPhase::Reveal,
            SessionPhase::Finished => VisibleSessionPhase::Finished,
        }
    }
}
