#![forbid(unsafe_code)]

pub mod debounce;
pub mod error;
pub mod gateway;
pub mod i18n;
pub mod orchestrator;
pub mod progress;
pub mod quiz_service;

pub use quiz_core::Clock;

pub use debounce::Debouncer;
pub use error::{GatewayError, ProgressError, QuizServiceError, SubmitError};
pub use gateway::{
    AttemptAnswer, HttpGateway, HttpGatewayConfig, ProgressGateway, QuizGateway, SubmitReceipt,
};
pub use i18n::{KeyEcho, Translator};
pub use orchestrator::{CompletionReport, SessionController, Step};
pub use progress::{ProgressEngine, SyncOutcome};
pub use quiz_service::{QuizService, failure_message};
