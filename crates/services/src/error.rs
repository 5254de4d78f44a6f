//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::QuizId;
use storage::repository::StorageError;

/// Errors surfaced by remote gateways.
///
/// "No internet" (`Network`) and "server said no" (`Rejected`) are distinct
/// variants so the presentation layer can message them differently.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("resource not found")]
    NotFound,

    #[error("server rejected the request with status {0}")]
    Rejected(reqwest::StatusCode),

    #[error("network failure: {0}")]
    Network(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

/// Errors emitted by the progress synchronization engine.
///
/// Network failures never appear here: they are swallowed and deferred to
/// the next sync cycle. Only local durability failures propagate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading a quiz.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("quiz {0} not found")]
    NotFound(QuizId),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Submission failure, surfaced to the caller after an attempt finishes.
///
/// The session stays terminal no matter which variant occurs; the attempt
/// is already in the local history.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmitError {
    #[error("could not reach the server: {0}")]
    Offline(String),

    #[error("server rejected the attempt with status {0}")]
    Rejected(reqwest::StatusCode),

    #[error("quiz no longer exists on the server")]
    NotFound,

    #[error("unintelligible server response: {0}")]
    Invalid(String),
}

impl From<GatewayError> for SubmitError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Network(message) => Self::Offline(message),
            GatewayError::Rejected(status) => Self::Rejected(status),
            GatewayError::NotFound => Self::NotFound,
            GatewayError::InvalidPayload(message) => Self::Invalid(message),
        }
    }
}
