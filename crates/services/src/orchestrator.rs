use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use quiz_core::model::{AttemptRecord, MaterialId, OptionId, QuestionId, QuizDefinition, UserId};
use quiz_core::{
    Advance, AnswerFeedback, Answered, AttemptSummary, Clock, Finish, QuizMode, QuizSession,
    SessionError, SessionPhase, SessionProgress, SessionTick,
};
use storage::AttemptRepository;

use crate::error::SubmitError;
use crate::gateway::{AttemptAnswer, QuizGateway, SubmitReceipt};
use crate::progress::ProgressEngine;

/// What happened after completing an attempt: the local summary plus the
/// result of the one submission try.
///
/// A failed submission does not reopen the session; the attempt is already
/// in the local history and the caller decides how to message the failure.
#[derive(Debug, Clone)]
pub struct CompletionReport {
    pub summary: AttemptSummary,
    pub submission: Result<SubmitReceipt, SubmitError>,
}

/// Unified outcome of a driver command.
#[derive(Debug, Clone)]
pub enum Step {
    /// Selection applied to the current question.
    Selected,
    /// Practice: answer committed, feedback on display.
    Feedback(AnswerFeedback),
    /// Moved to the next question.
    Moved,
    /// Timed session still running.
    Running { remaining_sec: u32, low_time: bool },
    /// The attempt finished; completion side effects already ran.
    Completed(CompletionReport),
    /// The session was already terminal; nothing happened.
    Ignored,
}

/// Drives one [`QuizSession`] and runs its completion side effects.
///
/// The session itself is pure state; this controller adds everything
/// around it: the 1 Hz countdown ticker for exams, durable attempt
/// recording, marking the quiz's source material viewed, and the
/// exactly-once server submission. Submission happens on whichever path
/// terminates the attempt first (answering the last question, explicit
/// finish, or countdown expiry) and never again.
pub struct SessionController {
    user_id: UserId,
    lang: String,
    material_id: Option<MaterialId>,
    quiz_gateway: Arc<dyn QuizGateway>,
    attempts: Arc<dyn AttemptRepository>,
    progress: Arc<ProgressEngine>,
    clock: Clock,
    session: Mutex<QuizSession>,
    ticker: std::sync::Mutex<Option<JoinHandle<()>>>,
    completion: std::sync::Mutex<Option<CompletionReport>>,
}

impl SessionController {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        user_id: UserId,
        lang: impl Into<String>,
        definition: QuizDefinition,
        mode: QuizMode,
        material_id: Option<MaterialId>,
        quiz_gateway: Arc<dyn QuizGateway>,
        attempts: Arc<dyn AttemptRepository>,
        progress: Arc<ProgressEngine>,
        clock: Clock,
    ) -> Arc<Self> {
        let session = QuizSession::new(definition, mode, clock.now());
        Arc::new(Self {
            user_id,
            lang: lang.into(),
            material_id,
            quiz_gateway,
            attempts,
            progress,
            clock,
            session: Mutex::new(session),
            ticker: std::sync::Mutex::new(None),
            completion: std::sync::Mutex::new(None),
        })
    }

    // ── Commands ───────────────────────────────────────────────────────────

    /// Select an option for the current question.
    ///
    /// # Errors
    ///
    /// Propagates the session's validation errors unchanged.
    pub async fn select(
        &self,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<Step, SessionError> {
        let mut session = self.session.lock().await;
        match session.select_option(question_id, option_id)? {
            quiz_core::Select::Applied => Ok(Step::Selected),
            quiz_core::Select::Ignored => {
                debug!("select ignored, session already finished");
                Ok(Step::Ignored)
            }
        }
    }

    /// Commit the current selection.
    ///
    /// # Errors
    ///
    /// Propagates the session's validation errors unchanged.
    pub async fn answer(self: &Arc<Self>) -> Result<Step, SessionError> {
        let now = self.clock.now();
        let mut session = self.session.lock().await;
        match session.answer(now)? {
            Answered::Revealed(feedback) => Ok(Step::Feedback(feedback)),
            Answered::Advanced => Ok(Step::Moved),
            Answered::Finished(summary) => {
                let answers = Self::collect_answers(&session);
                drop(session);
                Ok(Step::Completed(self.complete(summary, answers).await))
            }
            Answered::Ignored => Ok(Step::Ignored),
        }
    }

    /// Advance past the current question.
    ///
    /// # Errors
    ///
    /// Propagates the session's validation errors unchanged.
    pub async fn next(self: &Arc<Self>) -> Result<Step, SessionError> {
        let now = self.clock.now();
        let mut session = self.session.lock().await;
        match session.next(now)? {
            Advance::Moved => Ok(Step::Moved),
            Advance::Finished(summary) => {
                let answers = Self::collect_answers(&session);
                drop(session);
                Ok(Step::Completed(self.complete(summary, answers).await))
            }
            Advance::Ignored => Ok(Step::Ignored),
        }
    }

    /// Skip the current question without answering.
    ///
    /// # Errors
    ///
    /// Propagates the session's validation errors unchanged.
    pub async fn skip(self: &Arc<Self>) -> Result<Step, SessionError> {
        let now = self.clock.now();
        let mut session = self.session.lock().await;
        match session.skip(now)? {
            Advance::Moved => Ok(Step::Moved),
            Advance::Finished(summary) => {
                let answers = Self::collect_answers(&session);
                drop(session);
                Ok(Step::Completed(self.complete(summary, answers).await))
            }
            Advance::Ignored => Ok(Step::Ignored),
        }
    }

    /// Terminate the attempt now, regardless of position.
    ///
    /// Idempotent across every finishing path: if a timer expiry or an
    /// earlier finish already completed the attempt this is a no-op.
    pub async fn finish(self: &Arc<Self>) -> Step {
        let now = self.clock.now();
        let mut session = self.session.lock().await;
        match session.finish(now) {
            Finish::Completed(summary) => {
                let answers = Self::collect_answers(&session);
                drop(session);
                Step::Completed(self.complete(summary, answers).await)
            }
            Finish::AlreadyFinished => {
                debug!("finish ignored, session already finished");
                Step::Ignored
            }
        }
    }

    /// Abandon the current state and start a fresh attempt.
    ///
    /// The attempt history survives; for exams, the countdown and its
    /// ticker restart.
    pub async fn reset(self: &Arc<Self>) {
        let mode = {
            let mut session = self.session.lock().await;
            session.reset(self.clock.now());
            session.mode()
        };
        if let Ok(mut slot) = self.completion.lock() {
            *slot = None;
        }
        if mode == QuizMode::Exam {
            self.start_countdown();
        }
    }

    // ── Countdown ──────────────────────────────────────────────────────────

    /// Spawn the 1 Hz countdown driver, replacing any previous one.
    ///
    /// The task holds only a weak handle, so dropping the controller stops
    /// the clock.
    pub fn start_countdown(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(Self::run_countdown(weak));
        if let Ok(mut slot) = self.ticker.lock() {
            if let Some(old) = slot.replace(handle) {
                old.abort();
            }
        }
    }

    async fn run_countdown(weak: Weak<Self>) {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(controller) = weak.upgrade() else {
                break;
            };
            let now = controller.clock.now();
            let mut session = controller.session.lock().await;
            match session.tick(now) {
                SessionTick::Running { .. } => {}
                SessionTick::Expired(summary) => {
                    let answers = Self::collect_answers(&session);
                    drop(session);
                    debug!("countdown expired, finishing attempt");
                    controller.complete(summary, answers).await;
                    break;
                }
                // Finished by a user action between ticks.
                SessionTick::Ignored => break,
            }
        }
    }

    /// Stop the countdown driver without finishing the session.
    pub fn stop_countdown(&self) {
        if let Ok(mut slot) = self.ticker.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    // ── Completion pipeline ────────────────────────────────────────────────

    /// Runs once per completed attempt, on whichever path finished it.
    async fn complete(&self, summary: AttemptSummary, answers: Vec<AttemptAnswer>) -> CompletionReport {
        self.stop_countdown();
        let quiz_id = { self.session.lock().await.definition().id() };

        // Local durability first: the attempt exists even if everything
        // after this fails.
        match AttemptRecord::new(quiz_id, summary.completed_at, summary.score, summary.total) {
            Ok(record) => {
                if let Err(error) = self.attempts.append_attempt(self.user_id, &record).await {
                    warn!(user = %self.user_id, quiz = %quiz_id, %error, "could not persist attempt");
                }
            }
            Err(error) => warn!(quiz = %quiz_id, %error, "attempt totals rejected"),
        }

        // Finishing a quiz counts as engaging with its source material.
        if let Some(material_id) = self.material_id {
            if let Err(error) = self.progress.mark_viewed(material_id, None).await {
                warn!(%material_id, %error, "could not mark material viewed");
            }
        }

        let submission = self
            .quiz_gateway
            .submit_attempt(quiz_id, &answers, &self.lang)
            .await
            .map_err(SubmitError::from);
        if let Err(error) = &submission {
            warn!(user = %self.user_id, quiz = %quiz_id, %error, "attempt submission failed");
        }

        let report = CompletionReport {
            summary,
            submission,
        };
        if let Ok(mut slot) = self.completion.lock() {
            *slot = Some(report.clone());
        }
        report
    }

    fn collect_answers(session: &QuizSession) -> Vec<AttemptAnswer> {
        session
            .definition()
            .questions()
            .iter()
            .filter_map(|question| {
                session
                    .selected_option(question.id())
                    .map(|option_id| AttemptAnswer {
                        question_id: question.id(),
                        option_id,
                    })
            })
            .collect()
    }

    // ── Views ──────────────────────────────────────────────────────────────

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub async fn phase(&self) -> SessionPhase {
        self.session.lock().await.phase()
    }

    pub async fn progress(&self) -> SessionProgress {
        self.session.lock().await.progress()
    }

    pub async fn is_finished(&self) -> bool {
        self.session.lock().await.is_finished()
    }

    pub async fn score(&self) -> u32 {
        self.session.lock().await.score()
    }

    pub async fn time_remaining_sec(&self) -> Option<u32> {
        self.session.lock().await.time_remaining_sec()
    }

    pub async fn attempt_count(&self) -> usize {
        self.session.lock().await.attempt_history().len()
    }

    /// Read access to the underlying session for richer views.
    pub async fn with_session<T>(&self, read: impl FnOnce(&QuizSession) -> T) -> T {
        read(&*self.session.lock().await)
    }

    /// The report from the most recent completion, if any. This is how a
    /// caller observes a countdown-driven finish it did not initiate.
    #[must_use]
    pub fn completion(&self) -> Option<CompletionReport> {
        self.completion.lock().ok().and_then(|slot| slot.clone())
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.ticker.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("user_id", &self.user_id)
            .field("lang", &self.lang)
            .finish_non_exhaustive()
    }
}
