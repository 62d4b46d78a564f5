use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{format_system_time, phase::VisibleSessionPhase, quiz::DifficultyDto},
    engine::{PlayerView, QuestionView, RevealSummary, SessionSnapshot, Standing},
    state::quiz::{Answer, Player},
};

/// Request to enter a session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRequest {
    #[validate(length(min = 1, max = 40))]
    pub name: String,
}

/// Answer submitted by a player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    pub player_id: Uuid,
    /// Question the client believes is open. Defaults to the open question.
    #[serde(default)]
    pub question_index: Option<usize>,
    pub option_index: usize,
}

/// Acknowledgement of a recorded answer. Correctness is only disclosed on reveal.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerReceipt {
    pub player_id: Uuid,
    pub question_index: usize,
    pub chosen_option_index: usize,
}

impl AnswerReceipt {
    /// Receipt for `answer` recorded on behalf of `player_id`.
    pub fn new(player_id: Uuid, answer: &Answer) -> Self {
        Self {
            player_id,
            question_index: answer.question_index,
            chosen_option_index: answer.chosen_option_index,
        }
    }
}

/// Player record as exposed by quiz and join responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub id: Uuid,
    pub name: String,
    pub score: u32,
    pub connected: bool,
    pub answers: usize,
    pub joined_at: String,
}

impl From<Player> for PlayerSummary {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            name: value.name,
            score: value.score,
            connected: value.connected,
            answers: value.answers.len(),
            joined_at: format_system_time(value.joined_at),
        }
    }
}

/// Public snapshot of a live session, pushed on every change.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSnapshotDto {
    pub quiz_id: Uuid,
    pub title: String,
    pub phase: VisibleSessionPhase,
    /// Increments on every phase transition.
    pub version: usize,
    pub current_question_index: Option<usize>,
    pub question_count: usize,
    pub time_remaining_seconds: u32,
    pub is_paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionViewDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reveal: Option<RevealSummaryDto>,
    pub players: Vec<PlayerViewDto>,
    pub max_players: usize,
    /// Joining is refused until a seat frees up.
    pub is_full: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaderboard: Option<Vec<StandingDto>>,
}

impl From<SessionSnapshot> for SessionSnapshotDto {
    fn from(value: SessionSnapshot) -> Self {
        Self {
            quiz_id: value.quiz_id,
            title: value.title,
            phase: value.phase.into(),
            version: value.version,
            current_question_index: value.current_question_index,
            question_count: value.question_count,
            time_remaining_seconds: value.time_remaining_seconds,
            is_paused: value.is_paused,
            question: value.question.map(Into::into),
            reveal: value.reveal.map(Into::into),
            players: value.players.into_iter().map(Into::into).collect(),
            max_players: value.max_players,
            is_full: value.is_full,
            leaderboard: value
                .leaderboard
                .map(|board| board.into_iter().map(Into::into).collect()),
        }
    }
}

/// Question as shown to players.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionViewDto {
    pub index: usize,
    pub text: String,
    pub options: Vec<String>,
    pub category: String,
    pub difficulty: DifficultyDto,
    pub base_points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl From<QuestionView> for QuestionViewDto {
    fn from(value: QuestionView) -> Self {
        Self {
            index: value.index,
            text: value.text,
            options: value.options,
            category: value.category,
            difficulty: value.difficulty.into(),
            base_points: value.base_points,
            correct_option_index: value.correct_option_index,
            explanation: value.explanation,
        }
    }
}

/// Aggregate results of the revealed question.
#[derive(Debug, Serialize, ToSchema)]
pub struct RevealSummaryDto {
    pub answered_count: usize,
    pub correct_count: usize,
    pub option_counts: Vec<usize>,
}

impl From<RevealSummary> for RevealSummaryDto {
    fn from(value: RevealSummary) -> Self {
        Self {
            answered_count: value.answered_count,
            correct_count: value.correct_count,
            option_counts: value.option_counts,
        }
    }
}

/// Player row of a snapshot.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerViewDto {
    pub id: Uuid,
    pub name: String,
    pub score: u32,
    pub connected: bool,
    pub has_answered: bool,
}

impl From<PlayerView> for PlayerViewDto {
    fn from(value: PlayerView) -> Self {
        Self {
            id: value.id,
            name: value.name,
            score: value.score,
            connected: value.connected,
            has_answered: value.has_answered,
        }
    }
}

/// Leaderboard row.
#[derive(Debug, Serialize, ToSchema)]
pub struct StandingDto {
    pub rank: usize,
    pub player_id: Uuid,
    pub name: String,
    pub score: u32,
    pub correct_answers: usize,
    pub total_answers: usize,
    /// Rounded to one decimal.
    pub accuracy_percent: f64,
    /// Rounded to one decimal.
    pub average_seconds_to_answer: f64,
    pub connected: bool,
}

impl From<Standing> for StandingDto {
    fn from(value: Standing) -> Self {
        Self {
            rank: value.rank,
            player_id: value.player_id,
            name: value.name,
            score: value.score,
            correct_answers: value.correct_answers,
            total_answers: value.total_answers,
            accuracy_percent: round_tenth(value.accuracy_percent),
            average_seconds_to_answer: round_tenth(value.average_seconds_to_answer),
            connected: value.connected,
        }
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standings_are_rounded_for_display() {
        let dto = StandingDto::from(Standing {
            rank: 1,
            player_id: Uuid::nil(),
            name: "Ada".into(),
            score: 230,
            correct_answers: 2,
            total_answers: 3,
            accuracy_percent: 200.0 / 3.0,
            average_seconds_to_answer: 7.0 / 3.0,
            connected: true,
        });
        assert_eq!(dto.accuracy_percent, 66.7);
        assert_eq!(dto.average_seconds_to_answer, 2.3);
    }

    #[test]
    fn answer_request_defaults_to_open_question() {
        let request: AnswerRequest = serde_json::from_value(serde_json::json!({
            "player_id": Uuid::nil(),
            "option_index": 2,
        }))
        .unwrap();
        assert_eq!(request.question_index, None);
        assert!(request.validate().is_ok());
    }
}
