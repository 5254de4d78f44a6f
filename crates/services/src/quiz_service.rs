use std::sync::Arc;

use tracing::debug;

use quiz_core::model::{MaterialId, QuizDefinition, QuizId, UserId};
use quiz_core::{Clock, QuizMode};
use storage::AttemptRepository;

use crate::error::{GatewayError, QuizServiceError};
use crate::gateway::QuizGateway;
use crate::i18n::Translator;
use crate::orchestrator::SessionController;
use crate::progress::ProgressEngine;

/// Loads quiz definitions and hands out session controllers over them.
pub struct QuizService {
    user_id: UserId,
    lang: String,
    gateway: Arc<dyn QuizGateway>,
    attempts: Arc<dyn AttemptRepository>,
    progress: Arc<ProgressEngine>,
    clock: Clock,
}

impl QuizService {
    #[must_use]
    pub fn new(
        user_id: UserId,
        lang: impl Into<String>,
        gateway: Arc<dyn QuizGateway>,
        attempts: Arc<dyn AttemptRepository>,
        progress: Arc<ProgressEngine>,
        clock: Clock,
    ) -> Self {
        Self {
            user_id,
            lang: lang.into(),
            gateway,
            attempts,
            progress,
            clock,
        }
    }

    /// Fetch a localized, validated quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` for an unknown quiz id;
    /// everything else (offline, rejection, malformed payload) comes back
    /// as `QuizServiceError::Gateway`.
    pub async fn load(&self, quiz_id: QuizId) -> Result<QuizDefinition, QuizServiceError> {
        self.gateway
            .fetch_quiz_definition(quiz_id, &self.lang)
            .await
            .map_err(|error| match error {
                GatewayError::NotFound => QuizServiceError::NotFound(quiz_id),
                other => QuizServiceError::Gateway(other),
            })
    }

    /// Load a quiz and start an attempt over it.
    ///
    /// Exam sessions come back with their countdown already running.
    /// `material_id` links the quiz to the learning material it belongs
    /// to; completion will mark that material viewed.
    ///
    /// # Errors
    ///
    /// Same contract as [`load`](Self::load).
    pub async fn start_session(
        &self,
        quiz_id: QuizId,
        mode: QuizMode,
        material_id: Option<MaterialId>,
    ) -> Result<Arc<SessionController>, QuizServiceError> {
        let definition = self.load(quiz_id).await?;
        debug!(quiz = %quiz_id, ?mode, questions = definition.len(), "starting session");
        let controller = SessionController::new(
            self.user_id,
            self.lang.clone(),
            definition,
            mode,
            material_id,
            Arc::clone(&self.gateway),
            Arc::clone(&self.attempts),
            Arc::clone(&self.progress),
            self.clock,
        );
        if mode == QuizMode::Exam {
            controller.start_countdown();
        }
        Ok(controller)
    }
}

/// Map a load failure to a user-facing message key and resolve it.
///
/// Offline and not-found get distinct messages; everything else shares a
/// generic server-trouble message.
#[must_use]
pub fn failure_message(error: &QuizServiceError, translator: &dyn Translator) -> String {
    let key = match error {
        QuizServiceError::NotFound(_) => "quiz.error.not_found",
        QuizServiceError::Gateway(GatewayError::Network(_)) => "quiz.error.offline",
        QuizServiceError::Gateway(_) => "quiz.error.server",
    };
    translator.t(key)
}
