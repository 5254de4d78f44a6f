use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::model::{
    AttemptHistory, AttemptRecord, OptionId, Question, QuestionId, QuizDefinition,
};
use crate::time::{Countdown, TickOutcome};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Local validation failures. These are recovered in place by the caller;
/// none of them involve the network or corrupt session state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no option selected for the current question")]
    NoSelection,

    #[error("question {0} was already answered and is locked")]
    QuestionLocked(QuestionId),

    #[error("question {0} is not the current question")]
    NotCurrentQuestion(QuestionId),

    #[error("option {0} does not belong to the current question")]
    UnknownOption(OptionId),

    #[error("explanation is not shown yet")]
    ExplanationHidden,

    #[error("cannot skip while the explanation is shown")]
    ExplanationVisible,

    #[error("command is not valid in this quiz mode")]
    WrongMode,
}

//
// ─── MODES AND PHASES ──────────────────────────────────────────────────────────
//

/// Assessment mode, fixed at session construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizMode {
    /// Per-question feedback: the correct answer and explanation are shown
    /// immediately after each answer.
    Practice,
    /// Timed, no feedback until the attempt ends.
    Exam,
}

/// Observable lifecycle phase, derived from session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    InProgress,
    /// Practice only: the current question's explanation is on display.
    Reviewing,
    Finished,
}

//
// ─── COMMAND OUTCOMES ──────────────────────────────────────────────────────────
//

/// Result of selecting an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Select {
    Applied,
    /// Session already finished; the command was a no-op.
    Ignored,
}

/// Per-question feedback produced by answering in Practice mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_id: QuestionId,
    pub selected: OptionId,
    pub correct_option_id: OptionId,
    pub is_correct: bool,
}

/// Totals for one completed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptSummary {
    pub score: u32,
    pub total: u32,
    pub unanswered: u32,
    pub completed_at: DateTime<Utc>,
}

/// Result of answering the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answered {
    /// Practice: the question was revealed and the explanation is shown.
    Revealed(AnswerFeedback),
    /// Exam: moved on to the next question.
    Advanced,
    /// Exam: that was the last question; the attempt is complete.
    Finished(AttemptSummary),
    /// Session already finished; the command was a no-op.
    Ignored,
}

/// Result of advancing past the current question (`next` or `skip`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved,
    Finished(AttemptSummary),
    Ignored,
}

/// Result of an explicit finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finish {
    Completed(AttemptSummary),
    /// The session was already terminal; nothing changed.
    AlreadyFinished,
}

/// Result of a countdown tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTick {
    Running { remaining_sec: u32, low_time: bool },
    /// The countdown hit zero on this tick and forced the finish.
    Expired(AttemptSummary),
    /// Untimed session, or already finished; the tick was a no-op.
    Ignored,
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub is_finished: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One quiz attempt: question sequencing, answer capture, scoring, timing,
/// and explanation display.
///
/// Every mutating command guards on the terminal flag before touching
/// state. A timer callback and a user action can land in the same tick
/// window, so commands arriving after the finish resolve to an `Ignored`
/// outcome instead of an error.
pub struct QuizSession {
    definition: QuizDefinition,
    mode: QuizMode,
    current: usize,
    selected: HashMap<QuestionId, OptionId>,
    answered: HashSet<QuestionId>,
    revealed: HashMap<QuestionId, OptionId>,
    explanation_visible: bool,
    score: u32,
    countdown: Option<Countdown>,
    finished: bool,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    attempt_history: AttemptHistory,
}

impl QuizSession {
    /// Create a session over a validated definition.
    ///
    /// Exam sessions start their countdown at the definition's duration;
    /// Practice sessions are untimed.
    #[must_use]
    pub fn new(definition: QuizDefinition, mode: QuizMode, started_at: DateTime<Utc>) -> Self {
        let countdown = match mode {
            QuizMode::Exam => Some(Countdown::new(definition.duration_sec())),
            QuizMode::Practice => None,
        };

        Self {
            definition,
            mode,
            current: 0,
            selected: HashMap::new(),
            answered: HashSet::new(),
            revealed: HashMap::new(),
            explanation_visible: false,
            score: 0,
            countdown,
            finished: false,
            started_at,
            completed_at: None,
            attempt_history: AttemptHistory::new(),
        }
    }

    // ── Commands ───────────────────────────────────────────────────────────

    /// Select (or re-select) an option for the current question.
    ///
    /// Re-selecting before `answer` overwrites the previous choice with no
    /// penalty; only the committed selection ever counts toward the score.
    ///
    /// # Errors
    ///
    /// Returns `NotCurrentQuestion`, `QuestionLocked` (already answered),
    /// or `UnknownOption`. A finished session ignores the command.
    pub fn select_option(
        &mut self,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<Select, SessionError> {
        if self.finished {
            return Ok(Select::Ignored);
        }
        let Some(question) = self.definition.question_at(self.current) else {
            return Ok(Select::Ignored);
        };
        if question.id() != question_id {
            return Err(SessionError::NotCurrentQuestion(question_id));
        }
        if self.answered.contains(&question_id) {
            return Err(SessionError::QuestionLocked(question_id));
        }
        if !question.has_option(option_id) {
            return Err(SessionError::UnknownOption(option_id));
        }

        self.selected.insert(question_id, option_id);
        Ok(Select::Applied)
    }

    /// Commit the selection for the current question.
    ///
    /// Practice reveals the correct option and shows the explanation
    /// without advancing. Exam advances immediately, finishing the attempt
    /// on the last question. The score increments at most once per
    /// question, on its first correct answer.
    ///
    /// # Errors
    ///
    /// Returns `NoSelection` when nothing is selected for the current
    /// question. A finished session ignores the command.
    pub fn answer(&mut self, now: DateTime<Utc>) -> Result<Answered, SessionError> {
        if self.finished {
            return Ok(Answered::Ignored);
        }
        let Some(question) = self.definition.question_at(self.current) else {
            return Ok(Answered::Ignored);
        };
        let question_id = question.id();
        let selected = *self
            .selected
            .get(&question_id)
            .ok_or(SessionError::NoSelection)?;

        let correct_option_id = question.correct_option_id();
        let is_correct = selected == correct_option_id;
        let first_answer = self.answered.insert(question_id);
        if first_answer && is_correct {
            self.score += 1;
        }

        match self.mode {
            QuizMode::Practice => {
                self.revealed.insert(question_id, correct_option_id);
                self.explanation_visible = true;
                Ok(Answered::Revealed(AnswerFeedback {
                    question_id,
                    selected,
                    correct_option_id,
                    is_correct,
                }))
            }
            QuizMode::Exam => match self.advance(now) {
                Advance::Finished(summary) => Ok(Answered::Finished(summary)),
                _ => Ok(Answered::Advanced),
            },
        }
    }

    /// Move past the current question after its explanation was shown.
    ///
    /// Clears the explanation and advances; reaching the end of the
    /// question list finishes the attempt.
    ///
    /// # Errors
    ///
    /// Returns `ExplanationHidden` in Practice mode when the current
    /// question has not been revealed. A finished session ignores the
    /// command.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
        if self.finished {
            return Ok(Advance::Ignored);
        }
        if self.mode == QuizMode::Practice && !self.explanation_visible {
            return Err(SessionError::ExplanationHidden);
        }
        self.explanation_visible = false;
        Ok(self.advance(now))
    }

    /// Decline to answer the current question and move on.
    ///
    /// Skipping neither scores nor reveals: the explanation for a skipped
    /// question is never shown.
    ///
    /// # Errors
    ///
    /// Returns `WrongMode` outside Practice and `ExplanationVisible` when
    /// the current question was already revealed. A finished session
    /// ignores the command.
    pub fn skip(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
        if self.finished {
            return Ok(Advance::Ignored);
        }
        if self.mode != QuizMode::Practice {
            return Err(SessionError::WrongMode);
        }
        if self.explanation_visible {
            return Err(SessionError::ExplanationVisible);
        }
        Ok(self.advance(now))
    }

    /// Force-terminate the attempt regardless of position.
    ///
    /// Idempotent: the first call completes the attempt and appends it to
    /// the history; every later call reports `AlreadyFinished` and changes
    /// nothing.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Finish {
        if self.finished {
            return Finish::AlreadyFinished;
        }
        Finish::Completed(self.finish_attempt(now))
    }

    /// Advance the exam countdown by one second.
    ///
    /// Reaching zero forces exactly one finish; redundant timer callbacks
    /// firing near zero resolve to `Ignored`. Practice sessions are
    /// untimed and ignore ticks entirely.
    pub fn tick(&mut self, now: DateTime<Utc>) -> SessionTick {
        if self.finished {
            return SessionTick::Ignored;
        }
        let Some(countdown) = self.countdown.as_mut() else {
            return SessionTick::Ignored;
        };
        match countdown.tick() {
            TickOutcome::Running => SessionTick::Running {
                remaining_sec: countdown.remaining_sec(),
                low_time: countdown.is_low(),
            },
            TickOutcome::Expired | TickOutcome::AlreadyExpired => {
                SessionTick::Expired(self.finish_attempt(now))
            }
        }
    }

    /// Start a fresh attempt over the same definition.
    ///
    /// Counters, selections, and reveals are cleared and the countdown is
    /// regenerated; the attempt history is preserved.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.current = 0;
        self.selected.clear();
        self.answered.clear();
        self.revealed.clear();
        self.explanation_visible = false;
        self.score = 0;
        self.finished = false;
        self.started_at = now;
        self.completed_at = None;
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.restart();
        }
    }

    // ── Internal transitions ───────────────────────────────────────────────

    fn advance(&mut self, now: DateTime<Utc>) -> Advance {
        self.current += 1;
        if self.current >= self.definition.len() {
            Advance::Finished(self.finish_attempt(now))
        } else {
            Advance::Moved
        }
    }

    /// The single terminal transition. Callers must check `finished` first.
    fn finish_attempt(&mut self, now: DateTime<Utc>) -> AttemptSummary {
        self.finished = true;
        self.explanation_visible = false;
        self.completed_at = Some(now);

        // Exam mode withholds per-question feedback until the end, then
        // reveals everything collectively.
        if self.mode == QuizMode::Exam {
            for question in self.definition.questions() {
                self.revealed.insert(question.id(), question.correct_option_id());
            }
        }

        let total = u32::try_from(self.definition.len()).unwrap_or(u32::MAX);
        let unanswered = total.saturating_sub(
            u32::try_from(self.selected.len()).unwrap_or(u32::MAX),
        );
        let summary = AttemptSummary {
            score: self.score,
            total,
            unanswered,
            completed_at: now,
        };

        // score <= total holds structurally: it increments at most once per
        // question id.
        if let Ok(record) = AttemptRecord::new(self.definition.id(), now, self.score, total) {
            self.attempt_history.record(record);
        }

        summary
    }

    // ── Views ──────────────────────────────────────────────────────────────

    #[must_use]
    pub fn definition(&self) -> &QuizDefinition {
        &self.definition
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.finished {
            SessionPhase::Finished
        } else if self.explanation_visible {
            SessionPhase::Reviewing
        } else {
            SessionPhase::InProgress
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.finished {
            None
        } else {
            self.definition.question_at(self.current)
        }
    }

    #[must_use]
    pub fn selected_option(&self, question_id: QuestionId) -> Option<OptionId> {
        self.selected.get(&question_id).copied()
    }

    /// The correct option for a question, once revealed.
    #[must_use]
    pub fn revealed_option(&self, question_id: QuestionId) -> Option<OptionId> {
        self.revealed.get(&question_id).copied()
    }

    #[must_use]
    pub fn is_revealed(&self, question_id: QuestionId) -> bool {
        self.revealed.contains_key(&question_id)
    }

    #[must_use]
    pub fn explanation_visible(&self) -> bool {
        self.explanation_visible
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Seconds left on the exam countdown; `None` for untimed sessions.
    #[must_use]
    pub fn time_remaining_sec(&self) -> Option<u32> {
        self.countdown.map(|c| c.remaining_sec())
    }

    /// Derived low-time warning signal for UI; always false when untimed.
    #[must_use]
    pub fn is_low_time(&self) -> bool {
        self.countdown.is_some_and(|c| c.is_low())
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn attempt_history(&self) -> &AttemptHistory {
        &self.attempt_history
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.definition.len();
        SessionProgress {
            total,
            answered: self.answered.len(),
            unanswered: total.saturating_sub(self.selected.len()),
            is_finished: self.finished,
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", &self.definition.id())
            .field("mode", &self.mode)
            .field("current", &self.current)
            .field("score", &self.score)
            .field("finished", &self.finished)
            .field("attempts", &self.attempt_history.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerOption, Difficulty, QuizId};
    use crate::time::fixed_now;

    fn build_question(id: u64) -> Question {
        // Correct option id equals the question id, capped at 3 options.
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec![
                AnswerOption::new(OptionId::new(1), "a"),
                AnswerOption::new(OptionId::new(2), "b"),
                AnswerOption::new(OptionId::new(3), "c"),
            ],
            OptionId::new(id.min(3)),
            format!("why {id}"),
            Difficulty::Medium,
            Vec::new(),
        )
        .unwrap()
    }

    fn build_quiz(questions: u64, duration_sec: u32) -> QuizDefinition {
        QuizDefinition::new(
            QuizId::new(1),
            "Fixture",
            duration_sec,
            (1..=questions).map(build_question).collect(),
        )
        .unwrap()
    }

    fn practice_session() -> QuizSession {
        QuizSession::new(build_quiz(3, 60), QuizMode::Practice, fixed_now())
    }

    fn exam_session(duration_sec: u32) -> QuizSession {
        QuizSession::new(build_quiz(3, duration_sec), QuizMode::Exam, fixed_now())
    }

    fn qid(id: u64) -> QuestionId {
        QuestionId::new(id)
    }

    fn oid(id: u64) -> OptionId {
        OptionId::new(id)
    }

    #[test]
    fn practice_answer_reveals_without_advancing() {
        let mut session = practice_session();
        let now = fixed_now();

        session.select_option(qid(1), oid(1)).unwrap();
        let outcome = session.answer(now).unwrap();

        let Answered::Revealed(feedback) = outcome else {
            panic!("expected reveal, got {outcome:?}");
        };
        assert!(feedback.is_correct);
        assert_eq!(feedback.correct_option_id, oid(1));
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.phase(), SessionPhase::Reviewing);
        assert_eq!(session.revealed_option(qid(1)), Some(oid(1)));
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn practice_scenario_correct_skip_incorrect() {
        let mut session = practice_session();
        let now = fixed_now();

        // Q1 answered correctly.
        session.select_option(qid(1), oid(1)).unwrap();
        session.answer(now).unwrap();
        assert!(matches!(session.next(now).unwrap(), Advance::Moved));

        // Q2 skipped: never revealed.
        assert!(matches!(session.skip(now).unwrap(), Advance::Moved));

        // Q3 answered incorrectly, then advanced past the end.
        session.select_option(qid(3), oid(1)).unwrap();
        session.answer(now).unwrap();
        let advance = session.next(now).unwrap();

        assert!(matches!(advance, Advance::Finished(_)));
        assert!(session.is_finished());
        assert_eq!(session.score(), 1);
        assert_eq!(session.progress().unanswered, 1);
        assert!(!session.is_revealed(qid(2)));
        assert_eq!(session.attempt_history().len(), 1);
        assert_eq!(session.attempt_history().latest().unwrap().score(), 1);
    }

    #[test]
    fn changing_selection_before_answer_only_final_choice_counts() {
        let mut session = practice_session();
        let now = fixed_now();

        session.select_option(qid(1), oid(3)).unwrap();
        session.select_option(qid(1), oid(2)).unwrap();
        session.select_option(qid(1), oid(1)).unwrap();
        assert_eq!(session.score(), 0);

        session.answer(now).unwrap();
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn question_locked_after_answer() {
        let mut session = practice_session();
        session.select_option(qid(1), oid(2)).unwrap();
        session.answer(fixed_now()).unwrap();

        let err = session.select_option(qid(1), oid(1)).unwrap_err();
        assert_eq!(err, SessionError::QuestionLocked(qid(1)));
        // The wrong first answer never scores, even on re-answer.
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn answer_without_selection_is_rejected() {
        let mut session = practice_session();
        let err = session.answer(fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::NoSelection);
    }

    #[test]
    fn select_validates_question_and_option() {
        let mut session = practice_session();

        let err = session.select_option(qid(2), oid(1)).unwrap_err();
        assert_eq!(err, SessionError::NotCurrentQuestion(qid(2)));

        let err = session.select_option(qid(1), oid(9)).unwrap_err();
        assert_eq!(err, SessionError::UnknownOption(oid(9)));
    }

    #[test]
    fn next_requires_visible_explanation_in_practice() {
        let mut session = practice_session();
        let err = session.next(fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::ExplanationHidden);
    }

    #[test]
    fn skip_rejected_while_explanation_is_shown() {
        let mut session = practice_session();
        let now = fixed_now();
        session.select_option(qid(1), oid(1)).unwrap();
        session.answer(now).unwrap();

        let err = session.skip(now).unwrap_err();
        assert_eq!(err, SessionError::ExplanationVisible);
    }

    #[test]
    fn skip_rejected_in_exam_mode() {
        let mut session = exam_session(60);
        let err = session.skip(fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::WrongMode);
    }

    #[test]
    fn finish_is_idempotent_with_single_history_entry() {
        let mut session = practice_session();
        let now = fixed_now();

        let first = session.finish(now);
        let Finish::Completed(summary) = first else {
            panic!("expected completion");
        };
        assert_eq!(summary.unanswered, 3);
        assert_eq!(session.finish(now), Finish::AlreadyFinished);
        assert_eq!(session.finish(now), Finish::AlreadyFinished);
        assert_eq!(session.attempt_history().len(), 1);
    }

    #[test]
    fn commands_on_finished_session_are_ignored() {
        let mut session = practice_session();
        let now = fixed_now();
        session.finish(now);

        assert_eq!(session.select_option(qid(1), oid(1)).unwrap(), Select::Ignored);
        assert_eq!(session.answer(now).unwrap(), Answered::Ignored);
        assert_eq!(session.next(now).unwrap(), Advance::Ignored);
        assert_eq!(session.skip(now).unwrap(), Advance::Ignored);
        assert_eq!(session.tick(now), SessionTick::Ignored);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn exam_answer_advances_and_last_question_finishes() {
        let mut session = exam_session(60);
        let now = fixed_now();

        session.select_option(qid(1), oid(1)).unwrap();
        assert_eq!(session.answer(now).unwrap(), Answered::Advanced);
        assert_eq!(session.phase(), SessionPhase::InProgress);
        // No per-question feedback mid-exam.
        assert!(!session.is_revealed(qid(1)));

        session.select_option(qid(2), oid(3)).unwrap();
        assert_eq!(session.answer(now).unwrap(), Answered::Advanced);

        session.select_option(qid(3), oid(3)).unwrap();
        let outcome = session.answer(now).unwrap();
        let Answered::Finished(summary) = outcome else {
            panic!("expected finish, got {outcome:?}");
        };

        // Q1 correct, Q2 wrong, Q3 correct.
        assert_eq!(summary.score, 2);
        assert_eq!(summary.unanswered, 0);
        // Collective reveal at the end of the exam.
        assert_eq!(session.revealed_option(qid(1)), Some(oid(1)));
        assert_eq!(session.revealed_option(qid(2)), Some(oid(2)));
        assert_eq!(session.revealed_option(qid(3)), Some(oid(3)));
    }

    #[test]
    fn exam_countdown_expiry_forces_single_finish() {
        let mut session = exam_session(3);
        let now = fixed_now();

        assert_eq!(
            session.tick(now),
            SessionTick::Running {
                remaining_sec: 2,
                low_time: false
            }
        );
        assert!(matches!(session.tick(now), SessionTick::Running { .. }));

        let SessionTick::Expired(summary) = session.tick(now) else {
            panic!("expected expiry on the third tick");
        };
        assert_eq!(summary.unanswered, 3);
        assert!(session.is_finished());

        // Redundant timer callbacks after zero are no-ops.
        assert_eq!(session.tick(now), SessionTick::Ignored);
        assert_eq!(session.tick(now), SessionTick::Ignored);
        assert_eq!(session.attempt_history().len(), 1);
    }

    #[test]
    fn one_second_exam_with_no_interaction() {
        let quiz = build_quiz(3, 1);
        let mut session = QuizSession::new(quiz, QuizMode::Exam, fixed_now());

        let SessionTick::Expired(summary) = session.tick(fixed_now()) else {
            panic!("expected expiry");
        };
        assert_eq!(summary.unanswered, 3);
        assert_eq!(summary.score, 0);
        assert!(session.is_finished());
    }

    #[test]
    fn ticks_are_ignored_in_practice() {
        let mut session = practice_session();
        assert_eq!(session.tick(fixed_now()), SessionTick::Ignored);
        assert_eq!(session.time_remaining_sec(), None);
        assert!(!session.is_low_time());
    }

    #[test]
    fn score_never_exceeds_question_count() {
        let mut session = practice_session();
        let now = fixed_now();

        for id in 1..=3 {
            // Option id == question id is correct for every fixture question.
            session.select_option(qid(id), oid(id)).unwrap();
            session.answer(now).unwrap();
            // Re-answering the revealed question cannot double-score.
            session.answer(now).unwrap();
            let _ = session.next(now);
        }

        assert_eq!(session.score(), 3);
        assert!(session.score() as usize <= session.definition().len());
        assert!(session.is_finished());
    }

    #[test]
    fn reset_clears_state_but_preserves_history_and_countdown() {
        let mut session = exam_session(30);
        let now = fixed_now();

        session.select_option(qid(1), oid(1)).unwrap();
        session.tick(now);
        session.tick(now);
        session.finish(now);
        assert_eq!(session.attempt_history().len(), 1);

        session.reset(now);

        assert!(!session.is_finished());
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.selected_option(qid(1)), None);
        assert!(!session.is_revealed(qid(1)));
        assert_eq!(session.time_remaining_sec(), Some(30));
        assert_eq!(session.attempt_history().len(), 1);

        // The fresh attempt runs independently of the first.
        session.finish(now);
        assert_eq!(session.attempt_history().len(), 2);
    }

    #[test]
    fn low_time_signal_tracks_countdown() {
        let mut session = exam_session(20);
        let now = fixed_now();
        for _ in 0..18 {
            session.tick(now);
        }
        assert_eq!(session.time_remaining_sec(), Some(2));
        assert!(session.is_low_time());
        assert!(!session.is_finished());
    }
}
