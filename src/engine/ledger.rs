//! Per-player answer records and running scores.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::state::quiz::{Answer, Player, Question};

use super::{error::EngineError, scoring};

/// The open question an answer is recorded against.
#[derive(Debug, Clone, Copy)]
pub struct OpenQuestion<'a> {
    /// Index of the open question in the run order.
    pub index: usize,
    /// The question itself, as prepared for this run.
    pub question: &'a Question,
    /// Countdown value when the answer arrives.
    pub seconds_remaining: u32,
    /// Countdown length of the question.
    pub time_limit_seconds: u32,
}

/// Players of a session in join order, with their answers and scores.
///
/// Scores only move through [`AnswerLedger::record`], so a player's score
/// always equals the sum of its awarded points.
#[derive(Debug, Clone, Default)]
pub struct AnswerLedger {
    players: IndexMap<Uuid, Player>,
}

impl AnswerLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of players, connected or not.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether nobody joined.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Look up a player.
    pub fn player(&self, id: Uuid) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Case-insensitive name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<&Player> {
        let needle = name.to_lowercase();
        self.players
            .values()
            .find(|player| player.name.to_lowercase() == needle)
    }

    /// Add a freshly joined player.
    pub fn insert(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    /// Remove a player entirely, keeping the order of the others.
    pub fn remove(&mut self, id: Uuid) -> Option<Player> {
        self.players.shift_remove(&id)
    }

    /// Flip the presence flag of a player.
    pub fn set_connected(&mut self, id: Uuid, connected: bool) -> Result<(), EngineError> {
        let player = self
            .players
            .get_mut(&id)
            .ok_or(EngineError::UnknownPlayer(id))?;
        player.connected = connected;
        Ok(())
    }

    /// Drop every player.
    pub fn clear(&mut self) {
        self.players.clear();
    }

    /// Number of connected players.
    pub fn connected_count(&self) -> usize {
        self.players.values().filter(|player| player.connected).count()
    }

    /// Number of players (connected or not) with an answer for `question_index`.
    pub fn answered_count(&self, question_index: usize) -> usize {
        self.players
            .values()
            .filter(|player| player.answer_for(question_index).is_some())
            .count()
    }

    /// Whether at least one player is connected and every connected player
    /// answered `question_index`.
    pub fn all_connected_answered(&self, question_index: usize) -> bool {
        let mut connected = self.players.values().filter(|player| player.connected);
        let mut any = false;
        let all = connected.all(|player| {
            any = true;
            player.answer_for(question_index).is_some()
        });
        any && all
    }

    /// Score and record an answer for the open question.
    ///
    /// Checks run in order: unknown player, stale question index, duplicate
    /// answer, option out of range. Nothing is written unless all pass.
    pub fn record(
        &mut self,
        player_id: Uuid,
        question_index: usize,
        chosen_option_index: usize,
        open: OpenQuestion<'_>,
    ) -> Result<Answer, EngineError> {
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(EngineError::UnknownPlayer(player_id))?;

        if question_index != open.index {
            return Err(EngineError::InvalidQuestionIndex {
                requested: question_index,
            });
        }

        if player.answer_for(question_index).is_some() {
            return Err(EngineError::DuplicateAnswer { question_index });
        }

        let option_count = open.question.options.len();
        if chosen_option_index >= option_count {
            return Err(EngineError::InvalidOption {
                option_index: chosen_option_index,
                option_count,
            });
        }

        let points_awarded =
            scoring::score(open.question, chosen_option_index, open.seconds_remaining);
        let answer = Answer {
            question_index,
            chosen_option_index,
            is_correct: chosen_option_index == open.question.correct_option_index,
            points_awarded,
            seconds_to_answer: open
                .time_limit_seconds
                .saturating_sub(open.seconds_remaining),
        };

        player.score += points_awarded;
        player.answers.push(answer.clone());
        debug_assert!(player.answers.len() <= open.index + 1);
        Ok(answer)
    }

    /// How many players picked each option of `question_index`.
    pub fn option_counts(&self, question_index: usize, option_count: usize) -> Vec<usize> {
        let mut counts = vec![0; option_count];
        for answer in self
            .players
            .values()
            .filter_map(|player| player.answer_for(question_index))
        {
            if let Some(count) = counts.get_mut(answer.chosen_option_index) {
                *count += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::quiz::Difficulty;

    fn question() -> Question {
        Question {
            id: "1".into(),
            text: "2 + 2?".into(),
            options: vec!["3".into(), "4".into(), "5".into()],
            correct_option_index: 1,
            category: "Math".into(),
            difficulty: Difficulty::Medium,
            time_limit_seconds: 30,
            base_points: 100,
            explanation: None,
        }
    }

    fn open(q: &Question, seconds_remaining: u32) -> OpenQuestion<'_> {
        OpenQuestion {
            index: 0,
            question: q,
            seconds_remaining,
            time_limit_seconds: 30,
        }
    }

    fn ledger_with(names: &[&str]) -> (AnswerLedger, Vec<Uuid>) {
        let mut ledger = AnswerLedger::new();
        let ids = names
            .iter()
            .map(|name| {
                let player = Player::new((*name).into());
                let id = player.id;
                ledger.insert(player);
                id
            })
            .collect();
        (ledger, ids)
    }

    #[test]
    fn record_scores_and_appends() {
        let q = question();
        let (mut ledger, ids) = ledger_with(&["Ada"]);

        let answer = ledger.record(ids[0], 0, 1, open(&q, 30)).unwrap();
        assert!(answer.is_correct);
        assert_eq!(answer.points_awarded, 168);
        assert_eq!(answer.seconds_to_answer, 0);

        let player = ledger.player(ids[0]).unwrap();
        assert_eq!(player.score, 168);
        assert_eq!(player.answers.len(), 1);
    }

    #[test]
    fn second_submission_is_rejected_whatever_the_option() {
        let q = question();
        let (mut ledger, ids) = ledger_with(&["Ada"]);
        ledger.record(ids[0], 0, 0, open(&q, 20)).unwrap();

        for option in [0, 1, 2, 99] {
            assert_eq!(
                ledger.record(ids[0], 0, option, open(&q, 19)),
                Err(EngineError::DuplicateAnswer { question_index: 0 })
            );
        }
        let player = ledger.player(ids[0]).unwrap();
        assert_eq!(player.answers.len(), 1);
        assert_eq!(player.score, 0);
    }

    #[test]
    fn invalid_submissions_leave_ledger_untouched() {
        let q = question();
        let (mut ledger, ids) = ledger_with(&["Ada"]);

        assert!(matches!(
            ledger.record(Uuid::new_v4(), 0, 1, open(&q, 30)),
            Err(EngineError::UnknownPlayer(_))
        ));
        assert!(matches!(
            ledger.record(ids[0], 1, 1, open(&q, 30)),
            Err(EngineError::InvalidQuestionIndex { requested: 1 })
        ));
        assert!(matches!(
            ledger.record(ids[0], 0, 3, open(&q, 30)),
            Err(EngineError::InvalidOption { option_index: 3, .. })
        ));
        assert!(ledger.player(ids[0]).unwrap().answers.is_empty());
    }

    #[test]
    fn all_connected_answered_ignores_absent_players() {
        let q = question();
        let (mut ledger, ids) = ledger_with(&["Ada", "Bob"]);
        assert!(!ledger.all_connected_answered(0));

        ledger.record(ids[0], 0, 1, open(&q, 25)).unwrap();
        assert!(!ledger.all_connected_answered(0));

        ledger.set_connected(ids[1], false).unwrap();
        assert!(ledger.all_connected_answered(0));

        ledger.set_connected(ids[0], false).unwrap();
        assert!(!ledger.all_connected_answered(0));
    }

    #[test]
    fn option_counts_tally_choices() {
        let q = question();
        let (mut ledger, ids) = ledger_with(&["Ada", "Bob", "Cy"]);
        ledger.record(ids[0], 0, 1, open(&q, 25)).unwrap();
        ledger.record(ids[1], 0, 1, open(&q, 20)).unwrap();
        ledger.record(ids[2], 0, 0, open(&q, 15)).unwrap();

        assert_eq!(ledger.option_counts(0, 3), vec![1, 2, 0]);
        assert_eq!(ledger.answered_count(0), 3);
    }

    #[test]
    fn name_lookup_ignores_case() {
        let (ledger, ids) = ledger_with(&["Ada"]);
        assert_eq!(ledger.find_by_name("aDA").map(|p| p.id), Some(ids[0]));
        assert!(ledger.find_by_name("Bob").is_none());
    }
}
