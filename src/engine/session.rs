//! Session engine: the single owner of a running quiz.

use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use rand::{SeedableRng, rngs::StdRng};
use uuid::Uuid;

use crate::state::{
    quiz::{Answer, Player, Question, Quiz, QuizSettings, prepare_questions},
    state_machine::{CloseReason, Plan, SessionEvent, SessionPhase, SessionStateMachine},
};

use super::{
    countdown::{Clock, Countdown, SystemClock, TickOutcome},
    error::{EngineError, normalize_name},
    ledger::{AnswerLedger, OpenQuestion},
    snapshot::{PlayerView, QuestionView, RevealSummary, SessionSnapshot},
    standings::{self, Standing},
};

/// Tunables that are not part of the quiz settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// How long results stay on screen before the next question opens.
    pub reveal_delay: Duration,
    /// Move on automatically once `reveal_delay` elapsed.
    pub auto_advance: bool,
    /// Close a question as soon as every connected player answered.
    pub fast_forward_when_all_answered: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            reveal_delay: Duration::from_secs(3),
            auto_advance: true,
            fast_forward_when_all_answered: true,
        }
    }
}

/// Observable effect of a clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEffect {
    /// Nothing changed.
    Idle,
    /// The countdown moved; the new value is attached.
    Counted(u32),
    /// The session moved to another phase.
    Transitioned(SessionPhase),
}

/// Owns every piece of mutable state of one quiz run.
///
/// All operations are synchronous and either fully apply or fail with the
/// session left as it was. Callers serialise access (one writer per session).
pub struct SessionEngine {
    quiz: Quiz,
    questions: Vec<Question>,
    options: EngineOptions,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    machine: SessionStateMachine,
    ledger: AnswerLedger,
    countdown: Countdown,
    current_question_index: usize,
    is_paused: bool,
    reveal_started_at: Option<Instant>,
}

impl SessionEngine {
    /// Open a lobby for `quiz`. Players stored with the quiz are not carried
    /// over; every session starts with an empty roster.
    pub fn new(mut quiz: Quiz, options: EngineOptions) -> Self {
        quiz.players.clear();
        quiz.is_active = false;
        let questions = quiz.questions.clone();

        Self {
            quiz,
            questions,
            options,
            clock: Arc::new(SystemClock),
            rng: StdRng::from_os_rng(),
            machine: SessionStateMachine::new(),
            ledger: AnswerLedger::new(),
            countdown: Countdown::new(),
            current_question_index: 0,
            is_paused: false,
            reveal_started_at: None,
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Make shuffling reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Quiz identifier.
    pub fn quiz_id(&self) -> Uuid {
        self.quiz.id
    }

    /// Settings of the quiz being played.
    pub fn settings(&self) -> &QuizSettings {
        &self.quiz.settings
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    /// Number of phase transitions so far.
    pub fn version(&self) -> usize {
        self.machine.version()
    }

    /// Countdown value.
    pub fn time_remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    /// Whether the countdown is frozen.
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Look up a player.
    pub fn player(&self, id: Uuid) -> Option<&Player> {
        self.ledger.player(id)
    }

    /// Question currently open or being revealed.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase() {
            SessionPhase::QuestionActive | SessionPhase::QuestionReveal => {
                self.questions.get(self.current_question_index)
            }
            SessionPhase::Waiting | SessionPhase::Finished => None,
        }
    }

    /// Add a player, or reconnect a disconnected one with the same name.
    pub fn join(&mut self, raw_name: &str) -> Result<Player, EngineError> {
        let name = normalize_name(raw_name)?;
        let max_players = self.quiz.settings.max_players;

        match self.phase() {
            SessionPhase::Finished => {
                return Err(EngineError::InvalidPhase {
                    phase: SessionPhase::Finished,
                });
            }
            SessionPhase::Waiting => {
                if self.ledger.len() >= max_players {
                    return Err(EngineError::SessionFull { max_players });
                }
                if self.ledger.find_by_name(&name).is_some() {
                    return Err(EngineError::NameTaken(name));
                }
            }
            SessionPhase::QuestionActive | SessionPhase::QuestionReveal => {
                if !self.quiz.settings.allow_rejoining {
                    return Err(EngineError::AlreadyStarted);
                }
                if let Some(existing) = self.ledger.find_by_name(&name) {
                    if existing.connected {
                        return Err(EngineError::NameTaken(name));
                    }
                    let id = existing.id;
                    self.ledger.set_connected(id, true)?;
                    return self.ledger.player(id).cloned().ok_or(EngineError::UnknownPlayer(id));
                }
                if self.ledger.len() >= max_players {
                    return Err(EngineError::SessionFull { max_players });
                }
            }
        }

        let player = Player::new(name);
        self.ledger.insert(player.clone());
        Ok(player)
    }

    /// Remove a player from the lobby, or mark them disconnected once the
    /// quiz runs so their answers stay on the leaderboard.
    pub fn leave(&mut self, player_id: Uuid) -> Result<(), EngineError> {
        match self.phase() {
            SessionPhase::Waiting => self
                .ledger
                .remove(player_id)
                .map(|_| ())
                .ok_or(EngineError::UnknownPlayer(player_id)),
            SessionPhase::QuestionActive | SessionPhase::QuestionReveal => {
                self.ledger.set_connected(player_id, false)?;
                self.fast_forward_if_all_answered()?;
                Ok(())
            }
            SessionPhase::Finished => Err(EngineError::InvalidPhase {
                phase: SessionPhase::Finished,
            }),
        }
    }

    /// Open the first question. Shuffle settings are applied here, once.
    pub fn start(&mut self) -> Result<(), EngineError> {
        match self.phase() {
            SessionPhase::Waiting => {}
            SessionPhase::Finished => {
                return Err(EngineError::InvalidPhase {
                    phase: SessionPhase::Finished,
                });
            }
            SessionPhase::QuestionActive | SessionPhase::QuestionReveal => {
                return Err(EngineError::AlreadyActive);
            }
        }
        if self.ledger.is_empty() {
            return Err(EngineError::NoPlayers);
        }
        if self.quiz.questions.is_empty() {
            return Err(EngineError::NoQuestions);
        }

        let plan = self.machine.plan(SessionEvent::Start)?;
        let now = self.clock.now();
        self.questions = prepare_questions(&self.quiz.questions, &self.quiz.settings, &mut self.rng);
        self.current_question_index = 0;
        self.is_paused = false;
        self.reveal_started_at = None;
        self.countdown
            .start(self.quiz.settings.time_per_question_seconds, now);
        self.quiz.is_active = true;
        self.commit(plan)?;
        Ok(())
    }

    /// Record an answer to the open question.
    pub fn submit_answer(
        &mut self,
        player_id: Uuid,
        chosen_option_index: usize,
    ) -> Result<Answer, EngineError> {
        self.submit_answer_for(player_id, self.current_question_index, chosen_option_index)
    }

    /// Record an answer, checking that it targets the open question.
    pub fn submit_answer_for(
        &mut self,
        player_id: Uuid,
        question_index: usize,
        chosen_option_index: usize,
    ) -> Result<Answer, EngineError> {
        let phase = self.phase();
        if phase != SessionPhase::QuestionActive {
            return Err(EngineError::InvalidPhase { phase });
        }
        if self.is_paused {
            return Err(EngineError::Paused);
        }

        let index = self.current_question_index;
        let question = &self.questions[index];
        let answer = self.ledger.record(
            player_id,
            question_index,
            chosen_option_index,
            OpenQuestion {
                index,
                question,
                seconds_remaining: self.countdown.remaining(),
                time_limit_seconds: self.countdown.duration(),
            },
        )?;

        self.fast_forward_if_all_answered()?;
        Ok(answer)
    }

    /// Close the open question before the countdown runs out.
    pub fn reveal(&mut self) -> Result<SessionPhase, EngineError> {
        let phase = self.phase();
        if phase != SessionPhase::QuestionActive {
            return Err(EngineError::InvalidPhase { phase });
        }
        self.close_question(CloseReason::Host)
    }

    /// Leave the reveal: open the next question, or finish after the last.
    pub fn advance(&mut self) -> Result<SessionPhase, EngineError> {
        let phase = self.phase();
        if phase != SessionPhase::QuestionReveal {
            return Err(EngineError::InvalidPhase { phase });
        }

        let next_index = self.current_question_index + 1;
        if next_index < self.questions.len() {
            let plan = self.machine.plan(SessionEvent::NextQuestion)?;
            let now = self.clock.now();
            self.current_question_index = next_index;
            self.reveal_started_at = None;
            self.countdown
                .start(self.quiz.settings.time_per_question_seconds, now);
            self.commit(plan)
        } else {
            let plan = self.machine.plan(SessionEvent::Finish)?;
            self.reveal_started_at = None;
            self.countdown.stop();
            self.quiz.is_active = false;
            self.commit(plan)
        }
    }

    /// Freeze the countdown of the open question.
    pub fn pause(&mut self) -> Result<(), EngineError> {
        let phase = self.phase();
        if phase != SessionPhase::QuestionActive {
            return Err(EngineError::InvalidPhase { phase });
        }
        if self.is_paused {
            return Err(EngineError::AlreadyPaused);
        }
        self.countdown.pause(self.clock.now());
        self.is_paused = true;
        Ok(())
    }

    /// Continue a paused countdown.
    pub fn resume(&mut self) -> Result<(), EngineError> {
        let phase = self.phase();
        if phase != SessionPhase::QuestionActive {
            return Err(EngineError::InvalidPhase { phase });
        }
        if !self.is_paused {
            return Err(EngineError::NotPaused);
        }
        self.countdown.resume(self.clock.now());
        self.is_paused = false;
        Ok(())
    }

    /// Drop the run and every player, back to an empty lobby.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        let plan = self.machine.plan(SessionEvent::Reset)?;
        self.ledger.clear();
        self.countdown = Countdown::new();
        self.questions = self.quiz.questions.clone();
        self.current_question_index = 0;
        self.is_paused = false;
        self.reveal_started_at = None;
        self.quiz.is_active = false;
        self.commit(plan)?;
        Ok(())
    }

    /// Advance time-driven state: the countdown while a question is open,
    /// the reveal delay while results are shown.
    pub fn tick(&mut self) -> Result<TickEffect, EngineError> {
        let now = self.clock.now();
        match self.phase() {
            SessionPhase::QuestionActive => {
                if self.is_paused {
                    return Ok(TickEffect::Idle);
                }
                match self.countdown.tick(now) {
                    TickOutcome::Unchanged => Ok(TickEffect::Idle),
                    TickOutcome::Decremented(remaining) => Ok(TickEffect::Counted(remaining)),
                    TickOutcome::Expired => self
                        .close_question(CloseReason::TimeUp)
                        .map(TickEffect::Transitioned),
                }
            }
            SessionPhase::QuestionReveal => {
                let due = self.reveal_started_at.is_some_and(|started| {
                    now.saturating_duration_since(started) >= self.options.reveal_delay
                });
                if self.options.auto_advance && due {
                    self.advance().map(TickEffect::Transitioned)
                } else {
                    Ok(TickEffect::Idle)
                }
            }
            SessionPhase::Waiting | SessionPhase::Finished => Ok(TickEffect::Idle),
        }
    }

    /// Ranked players with their statistics.
    pub fn standings(&self) -> Vec<Standing> {
        standings::rank(self.ledger.players())
    }

    /// Read-only view of the whole session.
    pub fn snapshot(&self) -> SessionSnapshot {
        let phase = self.phase();
        let settings = &self.quiz.settings;
        let index = self.current_question_index;
        let in_question = matches!(
            phase,
            SessionPhase::QuestionActive | SessionPhase::QuestionReveal
        );
        let revealed = phase == SessionPhase::QuestionReveal;

        let question = self.current_question().map(|question| {
            let show_key = revealed && settings.show_correct_answer;
            QuestionView {
                index,
                text: question.text.clone(),
                options: question.options.clone(),
                category: question.category.clone(),
                difficulty: question.difficulty,
                base_points: question.base_points,
                correct_option_index: show_key.then_some(question.correct_option_index),
                explanation: if show_key {
                    question.explanation.clone()
                } else {
                    None
                },
            }
        });

        let reveal = self
            .current_question()
            .filter(|_| revealed)
            .map(|question| {
                let option_counts = self.ledger.option_counts(index, question.options.len());
                RevealSummary {
                    answered_count: self.ledger.answered_count(index),
                    correct_count: option_counts
                        .get(question.correct_option_index)
                        .copied()
                        .unwrap_or_default(),
                    option_counts,
                }
            });

        let players = self
            .ledger
            .players()
            .map(|player| PlayerView {
                id: player.id,
                name: player.name.clone(),
                score: player.score,
                connected: player.connected,
                has_answered: in_question && player.answer_for(index).is_some(),
            })
            .collect();

        let leaderboard = (settings.show_leaderboard || phase == SessionPhase::Finished)
            .then(|| self.standings());

        SessionSnapshot {
            quiz_id: self.quiz.id,
            title: self.quiz.title.clone(),
            phase,
            version: self.version(),
            current_question_index: (phase != SessionPhase::Waiting).then_some(index),
            question_count: self.questions.len(),
            time_remaining_seconds: self.countdown.remaining(),
            is_paused: self.is_paused,
            question,
            reveal,
            players,
            max_players: settings.max_players,
            is_full: self.ledger.len() >= settings.max_players,
            leaderboard,
        }
    }

    /// Quiz document reflecting the current run, ready to persist. Questions
    /// are stored in run order so answer indices line up.
    pub fn to_quiz(&self) -> Quiz {
        Quiz {
            questions: self.questions.clone(),
            players: self.ledger.players().cloned().collect(),
            updated_at: SystemTime::now(),
            ..self.quiz.clone()
        }
    }

    fn close_question(&mut self, reason: CloseReason) -> Result<SessionPhase, EngineError> {
        let plan = self.machine.plan(SessionEvent::CloseQuestion(reason))?;
        self.countdown.stop();
        self.is_paused = false;
        self.reveal_started_at = Some(self.clock.now());
        self.commit(plan)
    }

    fn fast_forward_if_all_answered(&mut self) -> Result<(), EngineError> {
        if self.options.fast_forward_when_all_answered
            && self.phase() == SessionPhase::QuestionActive
            && self
                .ledger
                .all_connected_answered(self.current_question_index)
        {
            self.close_question(CloseReason::AllAnswered)?;
        }
        Ok(())
    }

    fn commit(&mut self, plan: Plan) -> Result<SessionPhase, EngineError> {
        Ok(self.machine.commit(plan)?)
    }
}
