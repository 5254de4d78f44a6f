mod attempt;
mod ids;
mod progress;
mod question;
mod quiz;

pub use ids::{MaterialId, OptionId, ParseIdError, QuestionId, QuizId, UserId};

pub use attempt::{AttemptError, AttemptHistory, AttemptRecord};
pub use progress::ViewedFact;
pub use question::{AnswerOption, Difficulty, Question, QuestionError};
pub use quiz::{QuizDefinition, QuizError};
