use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::QuizListItemEntity,
    dto::{
        format_system_time,
        session::PlayerSummary,
        validation::{validate_correct_index, validate_options},
    },
    state::quiz::{Difficulty, Question, Quiz, QuizSettings},
};

const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 6;
const MAX_BASE_POINTS: u32 = 10_000;

/// Payload used to author a brand-new quiz.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,
    #[validate(length(min = 1, max = 40))]
    pub host_name: String,
    #[validate(length(min = 1, max = 200), nested)]
    pub questions: Vec<QuestionInput>,
    /// Omitted fields fall back to the defaults.
    #[serde(default)]
    #[validate(nested)]
    pub settings: QuizSettingsDto,
}

/// Difficulty tier as exchanged with clients.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyDto {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl From<DifficultyDto> for Difficulty {
    fn from(value: DifficultyDto) -> Self {
        match value {
            DifficultyDto::Easy => Difficulty::Easy,
            DifficultyDto::Medium => Difficulty::Medium,
            DifficultyDto::Hard => Difficulty::Hard,
        }
    }
}

impl From<Difficulty> for DifficultyDto {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => DifficultyDto::Easy,
            Difficulty::Medium => DifficultyDto::Medium,
            Difficulty::Hard => DifficultyDto::Hard,
        }
    }
}

/// Incoming question definition.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionInput {
    /// Optional author identifier; generated from the position when omitted.
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub difficulty: DifficultyDto,
    #[serde(default = "default_time_limit")]
    pub time_limit_seconds: u32,
    #[serde(default = "default_base_points")]
    pub base_points: u32,
    #[serde(default)]
    pub explanation: Option<String>,
}

fn default_category() -> String {
    "General".into()
}

fn default_time_limit() -> u32 {
    30
}

fn default_base_points() -> u32 {
    100
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.text.trim().is_empty() {
            let mut err = ValidationError::new("text_blank");
            err.message = Some("Question text must not be blank".into());
            errors.add("text", err);
        }

        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&self.options.len()) {
            let mut err = ValidationError::new("options_count");
            err.message = Some(
                format!(
                    "A question needs between {MIN_OPTIONS} and {MAX_OPTIONS} options (got {})",
                    self.options.len()
                )
                .into(),
            );
            errors.add("options", err);
        } else if let Err(e) = validate_options(&self.options) {
            errors.add("options", e);
        }

        if let Err(e) = validate_correct_index(self.correct_option_index, &self.options) {
            errors.add("correct_option_index", e);
        }

        if self.base_points == 0 || self.base_points > MAX_BASE_POINTS {
            let mut err = ValidationError::new("base_points_range");
            err.message = Some(format!("Base points must be between 1 and {MAX_BASE_POINTS}").into());
            errors.add("base_points", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Run settings, used both for authoring and in responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct QuizSettingsDto {
    #[validate(range(min = 5, max = 300))]
    pub time_per_question_seconds: u32,
    pub show_correct_answer: bool,
    pub allow_rejoining: bool,
    pub shuffle_questions: bool,
    pub shuffle_answers: bool,
    #[validate(range(min = 1, max = 500))]
    pub max_players: usize,
    pub require_approval: bool,
    pub show_leaderboard: bool,
}

impl Default for QuizSettingsDto {
    fn default() -> Self {
        QuizSettings::default().into()
    }
}

impl From<QuizSettings> for QuizSettingsDto {
    fn from(value: QuizSettings) -> Self {
        Self {
            time_per_question_seconds: value.time_per_question_seconds,
            show_correct_answer: value.show_correct_answer,
            allow_rejoining: value.allow_rejoining,
            shuffle_questions: value.shuffle_questions,
            shuffle_answers: value.shuffle_answers,
            max_players: value.max_players,
            require_approval: value.require_approval,
            show_leaderboard: value.show_leaderboard,
        }
    }
}

impl From<QuizSettingsDto> for QuizSettings {
    fn from(value: QuizSettingsDto) -> Self {
        Self {
            time_per_question_seconds: value.time_per_question_seconds,
            show_correct_answer: value.show_correct_answer,
            allow_rejoining: value.allow_rejoining,
            shuffle_questions: value.shuffle_questions,
            shuffle_answers: value.shuffle_answers,
            max_players: value.max_players,
            require_approval: value.require_approval,
            show_leaderboard: value.show_leaderboard,
        }
    }
}

impl From<CreateQuizRequest> for Quiz {
    fn from(request: CreateQuizRequest) -> Self {
        let questions = request
            .questions
            .into_iter()
            .enumerate()
            .map(|(position, input)| Question {
                id: input.id.unwrap_or_else(|| (position + 1).to_string()),
                text: input.text.trim().to_string(),
                options: input
                    .options
                    .into_iter()
                    .map(|option| option.trim().to_string())
                    .collect(),
                correct_option_index: input.correct_option_index,
                category: input.category,
                difficulty: input.difficulty.into(),
                time_limit_seconds: input.time_limit_seconds,
                base_points: input.base_points,
                explanation: input.explanation,
            })
            .collect();

        Quiz::new(
            request.title.trim().to_string(),
            request.description,
            request.host_name.trim().to_string(),
            questions,
            request.settings.into(),
        )
    }
}

/// Question as shown to the host. The answer key is withheld while a run is
/// in progress.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionSummary {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option_index: Option<usize>,
    pub category: String,
    pub difficulty: DifficultyDto,
    pub time_limit_seconds: u32,
    pub base_points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionSummary {
    fn new(question: Question, with_answer_key: bool) -> Self {
        Self {
            id: question.id,
            text: question.text,
            options: question.options,
            correct_option_index: with_answer_key.then_some(question.correct_option_index),
            category: question.category,
            difficulty: question.difficulty.into(),
            time_limit_seconds: question.time_limit_seconds,
            base_points: question.base_points,
            explanation: question.explanation.filter(|_| with_answer_key),
        }
    }
}

/// Full quiz returned once created or fetched.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub host_name: String,
    /// Link players open to join the session.
    pub join_url: String,
    pub questions: Vec<QuestionSummary>,
    pub settings: QuizSettingsDto,
    pub is_active: bool,
    /// Players of the latest run as last persisted.
    pub players: Vec<PlayerSummary>,
    pub created_at: String,
    pub updated_at: String,
}

impl QuizSummary {
    /// Project a quiz, attaching the join link built by the caller. Answer
    /// keys are left out while the quiz is being played.
    pub fn from_quiz(quiz: Quiz, join_url: String) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            description: quiz.description,
            host_name: quiz.host_name,
            join_url,
            questions: quiz
                .questions
                .into_iter()
                .map(|question| QuestionSummary::new(question, !quiz.is_active))
                .collect(),
            settings: quiz.settings.into(),
            is_active: quiz.is_active,
            players: quiz.players.into_iter().map(Into::into).collect(),
            created_at: format_system_time(quiz.created_at),
            updated_at: format_system_time(quiz.updated_at),
        }
    }
}

/// Minimal projection of a quiz when listed.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizListItem {
    pub id: Uuid,
    pub title: String,
    pub host_name: String,
    pub question_count: usize,
    pub player_count: usize,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<QuizListItemEntity> for QuizListItem {
    fn from(value: QuizListItemEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            host_name: value.host_name,
            question_count: value.question_count,
            player_count: value.player_count,
            is_active: value.is_active,
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question_json() -> serde_json::Value {
        serde_json::json!({
            "text": "What is the capital of France?",
            "options": ["London", "Paris", "Berlin", "Madrid"],
            "correct_option_index": 1,
        })
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let request: CreateQuizRequest = serde_json::from_value(serde_json::json!({
            "title": "Capitals",
            "host_name": "Ada",
            "questions": [question_json()],
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let quiz: Quiz = request.into();
        assert_eq!(quiz.settings, QuizSettings::default());
        let question = &quiz.questions[0];
        assert_eq!(question.id, "1");
        assert_eq!(question.category, "General");
        assert_eq!(question.difficulty, Difficulty::Medium);
        assert_eq!(question.base_points, 100);
    }

    #[test]
    fn out_of_range_answer_key_is_rejected() {
        let mut question = question_json();
        question["correct_option_index"] = 4.into();
        let request: CreateQuizRequest = serde_json::from_value(serde_json::json!({
            "title": "Capitals",
            "host_name": "Ada",
            "questions": [question],
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn empty_quiz_and_bad_settings_are_rejected() {
        let request: CreateQuizRequest = serde_json::from_value(serde_json::json!({
            "title": "Empty",
            "host_name": "Ada",
            "questions": [],
        }))
        .unwrap();
        assert!(request.validate().is_err());

        let request: CreateQuizRequest = serde_json::from_value(serde_json::json!({
            "title": "Too fast",
            "host_name": "Ada",
            "questions": [question_json()],
            "settings": { "time_per_question_seconds": 1 },
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn question_count_is_capped() {
        let questions: Vec<_> = (0..201).map(|_| question_json()).collect();
        let request: CreateQuizRequest = serde_json::from_value(serde_json::json!({
            "title": "Marathon",
            "host_name": "Ada",
            "questions": questions,
        }))
        .unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("questions"));
    }

    #[test]
    fn authored_and_programmatic_difficulty_defaults_agree() {
        assert_eq!(Difficulty::from(DifficultyDto::default()), Difficulty::default());
    }

    #[test]
    fn answer_keys_are_hidden_while_the_quiz_runs() {
        let request: CreateQuizRequest = serde_json::from_value(serde_json::json!({
            "title": "Capitals",
            "host_name": "Ada",
            "questions": [question_json()],
        }))
        .unwrap();
        let mut quiz: Quiz = request.into();
        quiz.questions[0].explanation = Some("Seat of government".into());

        let idle = QuizSummary::from_quiz(quiz.clone(), String::new());
        assert_eq!(idle.questions[0].correct_option_index, Some(1));
        assert!(idle.questions[0].explanation.is_some());

        quiz.is_active = true;
        let running = QuizSummary::from_quiz(quiz, String::new());
        assert_eq!(running.questions[0].correct_option_index, None);
        assert_eq!(running.questions[0].explanation, None);
    }

    #[test]
    fn single_option_question_is_rejected() {
        let input = QuestionInput {
            id: None,
            text: "Only one?".into(),
            options: vec!["yes".into()],
            correct_option_index: 0,
            category: default_category(),
            difficulty: DifficultyDto::Easy,
            time_limit_seconds: 30,
            base_points: 100,
            explanation: None,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("options"));
    }
}
