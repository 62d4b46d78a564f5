use std::time::SystemTime;

use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

use crate::dao::models::{
    AnswerEntity, DifficultyEntity, PlayerEntity, QuestionEntity, QuizEntity, QuizSettingsEntity,
};

/// Difficulty tier of a question, driving the score multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    /// Plain points.
    Easy,
    /// Points scaled by 1.2.
    #[default]
    Medium,
    /// Points scaled by 1.5.
    Hard,
}

impl Difficulty {
    /// Multiplier applied to the raw points of a correct answer.
    pub fn multiplier(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.2,
            Difficulty::Hard => 1.5,
        }
    }
}

/// A multiple-choice question as authored for a quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Author-provided identifier, unique within the quiz.
    pub id: String,
    /// Prompt shown to players.
    pub text: String,
    /// Ordered answer options (at least two).
    pub options: Vec<String>,
    /// Index into `options` of the single correct answer.
    pub correct_option_index: usize,
    /// Free-form category label (e.g. "Geography").
    pub category: String,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Authored time limit. The running session clock uses
    /// [`QuizSettings::time_per_question_seconds`] instead.
    pub time_limit_seconds: u32,
    /// Points awarded for a correct answer before bonus and multiplier.
    pub base_points: u32,
    /// Optional explanation displayed once the answer is revealed.
    pub explanation: Option<String>,
}

impl Question {
    /// Permute the answer options in place, keeping `correct_option_index`
    /// pointing at the same option text.
    pub fn shuffle_options<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.options.len()).collect();
        order.shuffle(rng);

        let options = order.iter().map(|&i| self.options[i].clone()).collect();
        if let Some(position) = order.iter().position(|&i| i == self.correct_option_index) {
            self.correct_option_index = position;
        }
        self.options = options;
    }
}

/// Host-selected options for a quiz run. Immutable while a session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    /// Countdown length of every question.
    pub time_per_question_seconds: u32,
    /// Reveal the correct option once a question closes.
    pub show_correct_answer: bool,
    /// Allow joining (or rejoining) after the quiz started.
    pub allow_rejoining: bool,
    /// Shuffle question order when the run starts.
    pub shuffle_questions: bool,
    /// Shuffle option order of each question when the run starts.
    pub shuffle_answers: bool,
    /// Maximum number of players in the session.
    pub max_players: usize,
    /// Host must approve joins (recorded, not enforced by the engine).
    pub require_approval: bool,
    /// Expose the live leaderboard before the quiz finishes.
    pub show_leaderboard: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            time_per_question_seconds: 30,
            show_correct_answer: true,
            allow_rejoining: true,
            shuffle_questions: false,
            shuffle_answers: false,
            max_players: 50,
            require_approval: false,
            show_leaderboard: true,
        }
    }
}

/// One recorded answer. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Question this answer belongs to.
    pub question_index: usize,
    /// Option picked by the player.
    pub chosen_option_index: usize,
    /// Whether the pick matched the answer key.
    pub is_correct: bool,
    /// Points granted by the scoring function.
    pub points_awarded: u32,
    /// Seconds elapsed on the clock when the answer landed.
    pub seconds_to_answer: u32,
}

/// Player tracked during a quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Stable identifier handed back on join.
    pub id: Uuid,
    /// Display name, unique within the session ignoring case.
    pub name: String,
    /// Running total of awarded points.
    pub score: u32,
    /// Answers in submission order.
    pub answers: Vec<Answer>,
    /// Whether the player currently counts as present.
    pub connected: bool,
    /// Join timestamp.
    pub joined_at: SystemTime,
}

impl Player {
    /// Build a freshly joined, connected player with an empty ledger.
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            score: 0,
            answers: Vec::new(),
            connected: true,
            joined_at: SystemTime::now(),
        }
    }

    /// Answer recorded for `question_index`, if any.
    pub fn answer_for(&self, question_index: usize) -> Option<&Answer> {
        self.answers
            .iter()
            .find(|answer| answer.question_index == question_index)
    }
}

/// Authored quiz with its settings and the players of its latest run.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    /// Primary key.
    pub id: Uuid,
    /// Title shown on the join screen.
    pub title: String,
    /// Short description.
    pub description: String,
    /// Display name of the host.
    pub host_name: String,
    /// Ordered, non-empty list of questions.
    pub questions: Vec<Question>,
    /// Run settings.
    pub settings: QuizSettings,
    /// Players of the current (or last) run.
    pub players: Vec<Player>,
    /// Whether a run is in progress.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the quiz document was updated.
    pub updated_at: SystemTime,
}

impl Quiz {
    /// Build a new quiz with a fresh identifier and no players.
    pub fn new(
        title: String,
        description: String,
        host_name: String,
        questions: Vec<Question>,
        settings: QuizSettings,
    ) -> Self {
        let timestamp = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            host_name,
            questions,
            settings,
            players: Vec::new(),
            is_active: false,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}

/// Produce the question list for one run, applying the shuffle settings.
pub fn prepare_questions<R: Rng + ?Sized>(
    questions: &[Question],
    settings: &QuizSettings,
    rng: &mut R,
) -> Vec<Question> {
    let mut prepared = questions.to_vec();
    if settings.shuffle_questions && prepared.len() > 1 {
        prepared.shuffle(rng);
    }
    if settings.shuffle_answers {
        for question in &mut prepared {
            question.shuffle_options(rng);
        }
    }
    prepared
}

impl From<DifficultyEntity> for Difficulty {
    fn from(value: DifficultyEntity) -> Self {
        match value {
            DifficultyEntity::Easy => Difficulty::Easy,
            DifficultyEntity::Medium => Difficulty::Medium,
            DifficultyEntity::Hard => Difficulty::Hard,
        }
    }
}

impl From<Difficulty> for DifficultyEntity {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => DifficultyEntity::Easy,
            Difficulty::Medium => DifficultyEntity::Medium,
            Difficulty::Hard => DifficultyEntity::Hard,
        }
    }
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
            options: value.options,
            correct_option_index: value.correct_option_index,
            category: value.category,
            difficulty: value.difficulty.into(),
            time_limit_seconds: value.time_limit_seconds,
            base_points: value.base_points,
            explanation: value.explanation,
        }
    }
}

impl From<Question> for QuestionEntity {
    fn from(value: Question) -> Self {
        Self {
            id: value.id,
            text: value.text,
            options: value.options,
            correct_option_index: value.correct_option_index,
            category: value.category,
            difficulty: value.difficulty.into(),
            time_limit_seconds: value.time_limit_seconds,
            base_points: value.base_points,
            explanation: value.explanation,
        }
    }
}

impl From<QuizSettingsEntity> for QuizSettings {
    fn from(value: QuizSettingsEntity) -> Self {
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

impl From<QuizSettings> for QuizSettingsEntity {
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

impl From<AnswerEntity> for Answer {
    fn from(value: AnswerEntity) -> Self {
        Self {
            question_index: value.question_index,
            chosen_option_index: value.chosen_option_index,
            is_correct: value.is_correct,
            points_awarded: value.points_awarded,
            seconds_to_answer: value.seconds_to_answer,
        }
    }
}

impl From<Answer> for AnswerEntity {
    fn from(value: Answer) -> Self {
        Self {
            question_index: value.question_index,
            chosen_option_index: value.chosen_option_index,
            is_correct: value.is_correct,
            points_awarded: value.points_awarded,
            seconds_to_answer: value.seconds_to_answer,
        }
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            score: value.score,
            answers: value.answers.into_iter().map(Into::into).collect(),
            connected: value.connected,
            joined_at: value.joined_at,
        }
    }
}

impl From<Player> for PlayerEntity {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            name: value.name,
            score: value.score,
            answers: value.answers.into_iter().map(Into::into).collect(),
            connected: value.connected,
            joined_at: value.joined_at,
        }
    }
}

impl From<QuizEntity> for Quiz {
    fn from(value: QuizEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            host_name: value.host_name,
            questions: value.questions.into_iter().map(Into::into).collect(),
            settings: value.settings.into(),
            players: value.players.into_iter().map(Into::into).collect(),
            is_active: value.is_active,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<Quiz> for QuizEntity {
    fn from(value: Quiz) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            host_name: value.host_name,
            questions: value.questions.into_iter().map(Into::into).collect(),
            settings: value.settings.into(),
            players: value.players.into_iter().map(Into::into).collect(),
            is_active: value.is_active,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn question(id: &str, correct: usize) -> Question {
        Question {
            id: id.into(),
            text: format!("question {id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_option_index: correct,
            category: "General".into(),
            difficulty: Difficulty::Easy,
            time_limit_seconds: 30,
            base_points: 100,
            explanation: None,
        }
    }

    #[test]
    fn shuffle_options_keeps_answer_key_on_same_text() {
        let mut rng = StdRng::seed_from_u64(7);
        for correct in 0..4 {
            let mut q = question("1", correct);
            let expected = q.options[correct].clone();
            q.shuffle_options(&mut rng);
            assert_eq!(q.options[q.correct_option_index], expected);
            assert_eq!(q.options.len(), 4);
        }
    }

    #[test]
    fn prepare_questions_without_shuffle_is_identity() {
        let questions = vec![question("1", 0), question("2", 1)];
        let mut rng = StdRng::seed_from_u64(1);
        let prepared = prepare_questions(&questions, &QuizSettings::default(), &mut rng);
        assert_eq!(prepared, questions);
    }

    #[test]
    fn prepare_questions_shuffle_preserves_question_set() {
        let questions: Vec<_> = (0..8).map(|i| question(&i.to_string(), i % 4)).collect();
        let settings = QuizSettings {
            shuffle_questions: true,
            shuffle_answers: true,
            ..QuizSettings::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        let prepared = prepare_questions(&questions, &settings, &mut rng);

        let mut ids: Vec<_> = prepared.iter().map(|q| q.id.clone()).collect();
        ids.sort();
        let mut expected: Vec<_> = questions.iter().map(|q| q.id.clone()).collect();
        expected.sort();
        assert_eq!(ids, expected);

        for q in &prepared {
            let original = questions.iter().find(|o| o.id == q.id).unwrap();
            assert_eq!(
                q.options[q.correct_option_index],
                original.options[original.correct_option_index]
            );
        }
    }

    #[test]
    fn difficulty_multipliers() {
        assert_eq!(Difficulty::Easy.multiplier(), 1.0);
        assert_eq!(Difficulty::Medium.multiplier(), 1.2);
        assert_eq!(Difficulty::Hard.multiplier(), 1.5);
    }
}
