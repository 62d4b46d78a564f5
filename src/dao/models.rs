use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Difficulty tier as stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyEntity {
    Easy,
    Medium,
    Hard,
}

/// Question entry inside a stored quiz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Author-provided identifier.
    pub id: String,
    /// Prompt shown to players.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct_option_index: usize,
    /// Category label.
    pub category: String,
    /// Difficulty tier.
    pub difficulty: DifficultyEntity,
    /// Authored time limit in seconds.
    pub time_limit_seconds: u32,
    /// Base points for a correct answer.
    pub base_points: u32,
    /// Optional explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Stored run settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizSettingsEntity {
    pub time_per_question_seconds: u32,
    pub show_correct_answer: bool,
    pub allow_rejoining: bool,
    pub shuffle_questions: bool,
    pub shuffle_answers: bool,
    pub max_players: usize,
    pub require_approval: bool,
    pub show_leaderboard: bool,
}

/// Ledger entry embedded in a stored player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    pub question_index: usize,
    pub chosen_option_index: usize,
    pub is_correct: bool,
    pub points_awarded: u32,
    pub seconds_to_answer: u32,
}

/// Representation of a player stored alongside its quiz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Score derived from the ledger.
    pub score: u32,
    /// Ordered answers.
    pub answers: Vec<AnswerEntity>,
    /// Presence flag at the time of the write.
    pub connected: bool,
    /// Join timestamp.
    pub joined_at: SystemTime,
}

/// Aggregate quiz document persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizEntity {
    /// Primary key of the quiz.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Short description.
    pub description: String,
    /// Host display name.
    pub host_name: String,
    /// Ordered questions.
    pub questions: Vec<QuestionEntity>,
    /// Run settings.
    pub settings: QuizSettingsEntity,
    /// Players of the latest run with their ledgers.
    pub players: Vec<PlayerEntity>,
    /// Whether a run was in progress at the time of the write.
    pub is_active: bool,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the quiz entity was updated.
    pub updated_at: SystemTime,
}

/// Quiz list item entity (subset of [`QuizEntity`]) used by listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizListItemEntity {
    pub id: Uuid,
    pub title: String,
    pub host_name: String,
    pub question_count: usize,
    pub player_count: usize,
    pub is_active: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl From<&QuizEntity> for QuizListItemEntity {
    fn from(entity: &QuizEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title.clone(),
            host_name: entity.host_name.clone(),
            question_count: entity.questions.len(),
            player_count: entity.players.len(),
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
