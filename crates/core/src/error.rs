use thiserror::Error;

use crate::model::{AttemptError, QuestionError, QuizError};
use crate::session::SessionError;

/// Top-level error for the quiz domain crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
