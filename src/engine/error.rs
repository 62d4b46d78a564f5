use thiserror::Error;
use uuid::Uuid;

use crate::state::state_machine::{ApplyError, InvalidTransition, SessionPhase};

/// Maximum number of characters in a player name.
pub const MAX_NAME_LENGTH: usize = 40;

/// Coarse classification of engine failures, used to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The session cannot take more players.
    Capacity,
    /// The request clashes with something already recorded.
    Conflict,
    /// The operation is not valid in the current phase.
    State,
    /// A referenced player, question or option does not exist.
    NotFound,
    /// The request itself is malformed.
    Invalid,
}

/// Errors raised by the session engine. A failed operation leaves the
/// session untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Player capacity reached.
    #[error("session is full ({max_players} players)")]
    SessionFull {
        /// Configured capacity.
        max_players: usize,
    },
    /// Another player already uses this name.
    #[error("name `{0}` is already taken")]
    NameTaken(String),
    /// The player already answered this question.
    #[error("player already answered question {question_index}")]
    DuplicateAnswer {
        /// Question that was answered twice.
        question_index: usize,
    },
    /// Operation not available in the current phase.
    #[error("operation not allowed while session is {phase:?}")]
    InvalidPhase {
        /// Phase the session was in.
        phase: SessionPhase,
    },
    /// The quiz cannot start without players.
    #[error("at least one player must join before starting")]
    NoPlayers,
    /// The quiz has no questions to play.
    #[error("quiz has no questions")]
    NoQuestions,
    /// The quiz is already running.
    #[error("quiz is already running")]
    AlreadyActive,
    /// Late joins are disabled for this quiz.
    #[error("quiz already started and rejoining is disabled")]
    AlreadyStarted,
    /// Answers are not accepted while the clock is paused.
    #[error("question is paused")]
    Paused,
    /// The clock is already paused.
    #[error("question is already paused")]
    AlreadyPaused,
    /// The clock is not paused.
    #[error("question is not paused")]
    NotPaused,
    /// No player with this identifier in the session.
    #[error("unknown player `{0}`")]
    UnknownPlayer(Uuid),
    /// The answer targets a question other than the open one.
    #[error("question {requested} is not the current question")]
    InvalidQuestionIndex {
        /// Question index sent by the player.
        requested: usize,
    },
    /// The chosen option does not exist.
    #[error("option {option_index} does not exist (question has {option_count} options)")]
    InvalidOption {
        /// Option index sent by the player.
        option_index: usize,
        /// Number of options of the open question.
        option_count: usize,
    },
    /// Player name rejected.
    #[error("invalid player name: {0}")]
    InvalidName(&'static str),
    /// The state machine moved while an operation was in flight.
    #[error(transparent)]
    StaleTransition(#[from] ApplyError),
}

impl EngineError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::SessionFull { .. } => ErrorKind::Capacity,
            EngineError::NameTaken(_) | EngineError::DuplicateAnswer { .. } => {
                ErrorKind::Conflict
            }
            EngineError::InvalidPhase { .. }
            | EngineError::NoPlayers
            | EngineError::NoQuestions
            | EngineError::AlreadyActive
            | EngineError::AlreadyStarted
            | EngineError::Paused
            | EngineError::AlreadyPaused
            | EngineError::NotPaused
            | EngineError::StaleTransition(_) => ErrorKind::State,
            EngineError::UnknownPlayer(_)
            | EngineError::InvalidQuestionIndex { .. }
            | EngineError::InvalidOption { .. } => ErrorKind::NotFound,
            EngineError::InvalidName(_) => ErrorKind::Invalid,
        }
    }
}

impl From<InvalidTransition> for EngineError {
    fn from(err: InvalidTransition) -> Self {
        EngineError::InvalidPhase { phase: err.from }
    }
}

/// Trim and validate a player name.
pub fn normalize_name(raw: &str) -> Result<String, EngineError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(EngineError::InvalidName("name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(EngineError::InvalidName("name must be at most 40 characters"));
    }
    Ok(name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed() {
        assert_eq!(normalize_name("  Ada ").unwrap(), "Ada");
    }

    #[test]
    fn blank_and_long_names_are_rejected() {
        assert_eq!(normalize_name("   ").unwrap_err().kind(), ErrorKind::Invalid);
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(normalize_name(&long).is_err());
        assert!(normalize_name(&"é".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn kinds_follow_error_families() {
        assert_eq!(
            EngineError::SessionFull { max_players: 2 }.kind(),
            ErrorKind::Capacity
        );
        assert_eq!(
            EngineError::DuplicateAnswer { question_index: 0 }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(EngineError::NoPlayers.kind(), ErrorKind::State);
        assert_eq!(
            EngineError::UnknownPlayer(Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
    }
}
