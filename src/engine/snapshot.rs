//! Read-only views of a session for rendering.

use uuid::Uuid;

use crate::state::{quiz::Difficulty, state_machine::SessionPhase};

use super::standings::Standing;

/// Everything a presentation layer needs to draw the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Quiz being played.
    pub quiz_id: Uuid,
    /// Quiz title.
    pub title: String,
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Number of phase transitions so far.
    pub version: usize,
    /// Index of the current question, `None` in the lobby.
    pub current_question_index: Option<usize>,
    /// Number of questions in the run.
    pub question_count: usize,
    /// Countdown value.
    pub time_remaining_seconds: u32,
    /// Whether the countdown is frozen.
    pub is_paused: bool,
    /// Current question, hidden in the lobby and after the quiz.
    pub question: Option<QuestionView>,
    /// Results of the current question while it is being revealed.
    pub reveal: Option<RevealSummary>,
    /// Players in join order.
    pub players: Vec<PlayerView>,
    /// Seat limit of the session.
    pub max_players: usize,
    /// No seat left for a newcomer. Disconnected players keep their seat.
    pub is_full: bool,
    /// Ranked standings, when the leaderboard is visible.
    pub leaderboard: Option<Vec<Standing>>,
}

/// Question as shown to players.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    /// Index in the run order.
    pub index: usize,
    /// Prompt.
    pub text: String,
    /// Options in display order.
    pub options: Vec<String>,
    /// Category label.
    pub category: String,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Base points.
    pub base_points: u32,
    /// Answer key, only once revealed and when the quiz shows answers.
    pub correct_option_index: Option<usize>,
    /// Explanation, revealed together with the answer key.
    pub explanation: Option<String>,
}

/// Aggregate results of the revealed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealSummary {
    /// Players who answered.
    pub answered_count: usize,
    /// Players who answered correctly.
    pub correct_count: usize,
    /// Picks per option.
    pub option_counts: Vec<usize>,
}

/// Lightweight player row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerView {
    /// Player identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Total points.
    pub score: u32,
    /// Presence flag.
    pub connected: bool,
    /// Whether the player answered the current question.
    pub has_answered: bool,
}
