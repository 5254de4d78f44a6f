#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod session;
pub mod time;

pub use error::Error;
pub use session::{
    Advance, AnswerFeedback, Answered, AttemptSummary, Finish, QuizMode, QuizSession, Select,
    SessionError, SessionPhase, SessionProgress, SessionTick,
};
pub use time::{Clock, Countdown, TickOutcome};
