use thiserror::Error;

/// High-level phases a quiz session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Lobby: players join, nothing is scored yet.
    Waiting,
    /// A question is open and its countdown is running (or paused).
    QuestionActive,
    /// The current question is closed and its results are shown.
    QuestionReveal,
    /// Every question has been played; final standings are available.
    Finished,
}

/// Why an open question was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The countdown reached zero.
    TimeUp,
    /// Every connected player has answered.
    AllAnswered,
    /// The host closed the question early.
    Host,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Host starts the quiz from the lobby.
    Start,
    /// The open question closes.
    CloseQuestion(CloseReason),
    /// Move from a reveal to the next question.
    NextQuestion,
    /// Move from the last reveal to the final standings.
    Finish,
    /// Wipe the run and return to the lobby.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Errors that can occur when committing a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// State machine phase changed since the plan was created.
    #[error("phase changed since planning (expected {expected:?}, got {actual:?})")]
    PhaseMismatch {
        /// Phase when plan was created.
        expected: SessionPhase,
        /// Current phase.
        actual: SessionPhase,
    },
    /// State machine version changed since the plan was created.
    #[error("version changed since planning (expected {expected}, got {actual})")]
    VersionMismatch {
        /// Version the plan expects after commit.
        expected: usize,
        /// Version the machine would reach instead.
        actual: usize,
    },
}

/// A validated transition that has not been committed yet.
///
/// Callers plan first, perform the side work the transition needs, then
/// commit. Dropping a plan leaves the machine untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Phase the state machine is currently in.
    pub from: SessionPhase,
    /// Phase the state machine will transition to.
    pub to: SessionPhase,
    /// Event that triggered this transition.
    pub event: SessionEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
}

/// State machine implementing the session lifecycle
/// `Waiting → QuestionActive ⇄ QuestionReveal → Finished`, with `Reset` back
/// to the lobby from anywhere.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    version: usize,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Waiting,
            version: 0,
        }
    }
}

impl SessionStateMachine {
    /// Create a new state machine initialised in the lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Validate that `event` can be applied from the current phase.
    pub fn plan(&self, event: SessionEvent) -> Result<Plan, InvalidTransition> {
        let to = self.compute_transition(event)?;
        Ok(Plan {
            from: self.phase,
            to,
            event,
            version_next: self.version + 1,
        })
    }

    /// Commit a plan produced by [`Self::plan`], returning the new phase.
    pub fn commit(&mut self, plan: Plan) -> Result<SessionPhase, ApplyError> {
        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        Ok(self.phase)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (_, SessionEvent::Reset) => SessionPhase::Waiting,
            (SessionPhase::Waiting, SessionEvent::Start) => SessionPhase::QuestionActive,
            (SessionPhase::QuestionActive, SessionEvent::CloseQuestion(_)) => {
                SessionPhase::QuestionReveal
            }
            (SessionPhase::QuestionReveal, SessionEvent::NextQuestion) => {
                SessionPhase::QuestionActive
            }
            (SessionPhase::QuestionReveal, SessionEvent::Finish) => SessionPhase::Finished,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut SessionStateMachine, event: SessionEvent) -> SessionPhase {
        let plan = sm.plan(event).unwrap();
        sm.commit(plan).unwrap()
    }

    #[test]
    fn initial_state_is_waiting() {
        let sm = SessionStateMachine::new();
        assert_eq!(sm.phase(), SessionPhase::Waiting);
        assert_eq!(sm.version(), 0);
    }

    #[test]
    fn full_happy_path_through_quiz() {
        let mut sm = SessionStateMachine::new();

        assert_eq!(
            apply(&mut sm, SessionEvent::Start),
            SessionPhase::QuestionActive
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::CloseQuestion(CloseReason::TimeUp)),
            SessionPhase::QuestionReveal
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::NextQuestion),
            SessionPhase::QuestionActive
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::CloseQuestion(CloseReason::Host)),
            SessionPhase::QuestionReveal
        );
        assert_eq!(apply(&mut sm, SessionEvent::Finish), SessionPhase::Finished);
        assert_eq!(sm.version(), 5);
        assert_eq!(apply(&mut sm, SessionEvent::Reset), SessionPhase::Waiting);
    }

    #[test]
    fn finished_only_accepts_reset() {
        let mut sm = SessionStateMachine::new();
        apply(&mut sm, SessionEvent::Start);
        apply(&mut sm, SessionEvent::CloseQuestion(CloseReason::AllAnswered));
        apply(&mut sm, SessionEvent::Finish);

        for event in [
            SessionEvent::Start,
            SessionEvent::CloseQuestion(CloseReason::Host),
            SessionEvent::NextQuestion,
            SessionEvent::Finish,
        ] {
            let err = sm.plan(event).unwrap_err();
            assert_eq!(err.from, SessionPhase::Finished);
            assert_eq!(err.event, event);
        }
    }

    #[test]
    fn invalid_transition_returns_error() {
        let sm = SessionStateMachine::new();
        let err = sm.plan(SessionEvent::NextQuestion).unwrap_err();
        assert_eq!(err.from, SessionPhase::Waiting);
        assert_eq!(err.event, SessionEvent::NextQuestion);
    }

    #[test]
    fn question_cannot_close_twice() {
        let mut sm = SessionStateMachine::new();
        apply(&mut sm, SessionEvent::Start);
        apply(&mut sm, SessionEvent::CloseQuestion(CloseReason::TimeUp));
        assert!(
            sm.plan(SessionEvent::CloseQuestion(CloseReason::TimeUp))
                .is_err()
        );
    }

    #[test]
    fn stale_plan_is_rejected() {
        let mut sm = SessionStateMachine::new();
        let stale = sm.plan(SessionEvent::Reset).unwrap();
        apply(&mut sm, SessionEvent::Start);

        let err = sm.commit(stale).unwrap_err();
        assert_eq!(
            err,
            ApplyError::PhaseMismatch {
                expected: SessionPhase::Waiting,
                actual: SessionPhase::QuestionActive,
            }
        );
        assert_eq!(sm.phase(), SessionPhase::QuestionActive);
    }

    #[test]
    fn dropped_plan_leaves_machine_untouched() {
        let sm = SessionStateMachine::new();
        let _plan = sm.plan(SessionEvent::Start).unwrap();
        assert_eq!(sm.phase(), SessionPhase::Waiting);
        assert_eq!(sm.version(), 0);
    }
}
